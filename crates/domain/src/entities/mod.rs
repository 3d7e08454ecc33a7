pub mod service_request;
pub mod user;

pub use service_request::*;
pub use user::*;
