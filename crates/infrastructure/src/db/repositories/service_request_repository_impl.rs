//! 服务请求记录 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::db::DbPool;
use domain::{
    PartyProfile, RepositoryError, RequestId, RequestStatus, ServiceRequest,
    ServiceRequestRepository, UserId, VerificationCode,
};

/// 数据库请求记录模型
#[derive(Debug, Clone, FromRow)]
struct DbServiceRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_avatar: Option<String>,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub provider_avatar: Option<String>,
    pub service_type: String,
    pub location: String,
    pub price: f64,
    pub status: String,
    pub verification_code: String,
    pub duration_secs: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn status_to_str(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "pending",
        RequestStatus::Accepted => "accepted",
        RequestStatus::Completed => "completed",
        RequestStatus::Canceled => "canceled",
    }
}

fn status_from_str(raw: &str) -> Result<RequestStatus, RepositoryError> {
    match raw {
        "pending" => Ok(RequestStatus::Pending),
        "accepted" => Ok(RequestStatus::Accepted),
        "completed" => Ok(RequestStatus::Completed),
        "canceled" => Ok(RequestStatus::Canceled),
        other => Err(RepositoryError::storage(format!(
            "unknown request status in database: {other}"
        ))),
    }
}

impl TryFrom<DbServiceRequest> for ServiceRequest {
    type Error = RepositoryError;

    fn try_from(db: DbServiceRequest) -> Result<Self, Self::Error> {
        let verification_code = VerificationCode::parse(db.verification_code)
            .map_err(|e| RepositoryError::storage(format!("invalid code in database: {e}")))?;

        Ok(ServiceRequest {
            id: RequestId::from(db.id),
            requester: PartyProfile {
                id: UserId::from(db.requester_id),
                name: db.requester_name,
                avatar_url: db.requester_avatar,
            },
            provider: PartyProfile {
                id: UserId::from(db.provider_id),
                name: db.provider_name,
                avatar_url: db.provider_avatar,
            },
            service_type: db.service_type,
            location: db.location,
            price: db.price,
            status: status_from_str(&db.status)?,
            verification_code,
            duration_secs: db.duration_secs,
            created_at: db.created_at,
            started_at: db.started_at,
            completed_at: db.completed_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, requester_id, requester_name, requester_avatar, \
     provider_id, provider_name, provider_avatar, service_type, location, price, \
     status, verification_code, duration_secs, created_at, started_at, completed_at";

/// 服务请求记录 Repository 实现
pub struct PgServiceRequestRepository {
    pool: DbPool,
}

impl PgServiceRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRequestRepository for PgServiceRequestRepository {
    async fn create(&self, request: ServiceRequest) -> Result<ServiceRequest, RepositoryError> {
        let row = query_as::<_, DbServiceRequest>(&format!(
            r#"
            INSERT INTO service_requests
                (id, requester_id, requester_name, requester_avatar,
                 provider_id, provider_name, provider_avatar,
                 service_type, location, price, status, verification_code,
                 duration_secs, created_at, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(Uuid::from(request.id))
        .bind(Uuid::from(request.requester.id))
        .bind(&request.requester.name)
        .bind(&request.requester.avatar_url)
        .bind(Uuid::from(request.provider.id))
        .bind(&request.provider.name)
        .bind(&request.provider.avatar_url)
        .bind(&request.service_type)
        .bind(&request.location)
        .bind(request.price)
        .bind(status_to_str(request.status))
        .bind(request.verification_code.as_str())
        .bind(request.duration_secs)
        .bind(request.created_at)
        .bind(request.started_at)
        .bind(request.completed_at)
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

    async fn find_by_id(&self, id: RequestId) -> Result<Option<ServiceRequest>, RepositoryError> {
        let row = query_as::<_, DbServiceRequest>(&format!(
            "SELECT {SELECT_COLUMNS} FROM service_requests WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_id_and_code(
        &self,
        id: RequestId,
        code: &VerificationCode,
    ) -> Result<Option<ServiceRequest>, RepositoryError> {
        let row = query_as::<_, DbServiceRequest>(&format!(
            "SELECT {SELECT_COLUMNS} FROM service_requests WHERE id = $1 AND verification_code = $2"
        ))
        .bind(Uuid::from(id))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, request: ServiceRequest) -> Result<ServiceRequest, RepositoryError> {
        let row = query_as::<_, DbServiceRequest>(&format!(
            r#"
            UPDATE service_requests
            SET status = $2, duration_secs = $3, started_at = $4, completed_at = $5
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(Uuid::from(request.id))
        .bind(status_to_str(request.status))
        .bind(request.duration_secs)
        .bind(request.started_at)
        .bind(request.completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::storage(e.to_string()))?;

        match row {
            Some(row) => row.try_into(),
            None => Err(RepositoryError::NotFound),
        }
    }
}
