//! Web API 层。
//!
//! 提供 Axum 路由，把 HTTP 请求委托给应用层的撮合服务，
//! 并承载实时通道：连接守门、注册、事件路由。

mod auth;
mod error;
mod routes;
mod state;
mod ws_connection;

pub use auth::JwtService;
pub use config::JwtConfig;
pub use routes::router;
pub use state::AppState;
