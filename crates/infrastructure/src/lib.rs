//! 基础设施层
//!
//! 仓储接口的具体实现：PostgreSQL 持久化实现，以及用于测试和
//! 无数据库部署的内存实现。

pub mod db;
pub mod memory;

pub use db::{create_pg_pool, DbPool, PgServiceRequestRepository, PgUserRepository};
pub use memory::{MemoryServiceRequestRepository, MemoryUserRepository};
