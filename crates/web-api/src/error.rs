use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::Domain(domain::DomainError::ValidationError { field, message }) => {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INVALID_ARGUMENT",
                    format!("{}: {}", field, message),
                )
            }
            AppErr::Domain(domain::DomainError::InvalidVerificationCode { reason }) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_CODE_FORMAT", reason)
            }
            AppErr::Domain(domain::DomainError::InvalidStatusTransition { from, to }) => {
                ApiError::new(
                    StatusCode::CONFLICT,
                    "INVALID_STATUS_TRANSITION",
                    format!("cannot move request from {:?} to {:?}", from, to),
                )
            }
            // 核码失败是业务错误，提示用户但不重置核对流程
            AppErr::CodeMismatch => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "CODE_MISMATCH",
                "verification code does not match",
            ),
            AppErr::RequestExpired => ApiError::new(
                StatusCode::GONE,
                "REQUEST_EXPIRED",
                "no pending request, or the response window has expired",
            ),
            AppErr::UnknownUser(user_id) => ApiError::new(
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("user not found: {}", user_id),
            ),
            AppErr::Repository(repo_err) => match repo_err {
                domain::RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                domain::RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                domain::RepositoryError::Storage { message } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {}", message),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
