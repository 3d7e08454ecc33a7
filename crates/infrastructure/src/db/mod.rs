//! PostgreSQL 连接与仓储实现

pub mod repositories;

pub use repositories::{PgServiceRequestRepository, PgUserRepository};

use sqlx::postgres::PgPoolOptions;

/// 数据库连接池类型
pub type DbPool = sqlx::PgPool;

/// 创建 PostgreSQL 连接池
pub async fn create_pg_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
