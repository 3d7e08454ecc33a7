//! 应用层实现。
//!
//! 撮合核心的全部运行时状态都在这里：在线连接表、事件路由、
//! 请求生命周期协调，以及对时钟等外部适配器的抽象。

pub mod clock;
pub mod error;
pub mod presence;
pub mod router;
pub mod services;
pub mod timeout;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use presence::{ConnectionHandle, PresenceRegistry};
pub use router::{DeliveryOutcome, EventRouter};
pub use services::{MatchingService, MatchingServiceDependencies};
pub use timeout::TimeoutPolicy;
