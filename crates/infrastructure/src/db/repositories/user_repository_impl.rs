//! 用户账户 Repository 实现

use async_trait::async_trait;
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::db::DbPool;
use domain::{RepositoryError, UserAccount, UserId, UserRepository, UserRole};

/// 数据库用户模型
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: String,
}

fn role_to_str(role: UserRole) -> &'static str {
    match role {
        UserRole::Taker => "taker",
        UserRole::Provider => "provider",
    }
}

fn role_from_str(raw: &str) -> Result<UserRole, RepositoryError> {
    match raw {
        "taker" => Ok(UserRole::Taker),
        "provider" => Ok(UserRole::Provider),
        other => Err(RepositoryError::storage(format!(
            "unknown user role in database: {other}"
        ))),
    }
}

impl TryFrom<DbUser> for UserAccount {
    type Error = RepositoryError;

    fn try_from(db: DbUser) -> Result<Self, Self::Error> {
        Ok(UserAccount {
            id: UserId::from(db.id),
            name: db.name,
            avatar_url: db.avatar_url,
            role: role_from_str(&db.role)?,
        })
    }
}

/// 用户账户 Repository 实现
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let row = query_as::<_, DbUser>("SELECT id, name, avatar_url, role FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, user: UserAccount) -> Result<UserAccount, RepositoryError> {
        let row = query_as::<_, DbUser>(
            r#"
            INSERT INTO users (id, name, avatar_url, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, avatar_url, role
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(role_to_str(user.role))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict
            }
            _ => RepositoryError::storage(e.to_string()),
        })?;

        row.try_into()
    }
}
