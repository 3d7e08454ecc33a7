//! Fixitnow 服务撮合核心领域模型
//!
//! 包含服务请求、确认码、实时事件目录等核心实体，
//! 以及仓储接口和相关业务规则。

pub mod entities;
pub mod errors;
pub mod events;
pub mod repositories;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use repositories::*;
pub use value_objects::*;
