use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use domain::{RequestDetails, RequestId, ServiceRequest, UserId, UserRepository, VerificationCode};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequestPayload {
    provider_id: Uuid,
    #[serde(flatten)]
    details: RequestDetails,
    verification_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FetchRequestQuery {
    code: String,
}

#[derive(Debug, Deserialize)]
struct VerifyPayload {
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletePayload {
    duration_secs: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresenceResponse {
    user_id: Uuid,
    online: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/{request_id}", get(fetch_request))
        .route("/requests/{request_id}/verify", post(verify_request))
        .route("/requests/{request_id}/complete", post(complete_request))
        .route("/presence/{user_id}", get(presence_check))
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<(StatusCode, Json<ServiceRequest>), ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let code = payload
        .verification_code
        .map(VerificationCode::parse)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let record = state
        .matching_service
        .create_record(payload.details, UserId::from(payload.provider_id), code)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn fetch_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(request_id): Path<Uuid>,
    Query(query): Query<FetchRequestQuery>,
) -> Result<Json<ServiceRequest>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let code = VerificationCode::parse(query.code)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let record = state
        .matching_service
        .fetch_record(RequestId::from(request_id), &code)
        .await?;

    Ok(Json(record))
}

async fn verify_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<VerifyPayload>,
) -> Result<Json<ServiceRequest>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let record = state
        .matching_service
        .verify_code(RequestId::from(request_id), &payload.code)
        .await?;

    Ok(Json(record))
}

async fn complete_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<CompletePayload>,
) -> Result<Json<ServiceRequest>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let record = state
        .matching_service
        .complete_request(RequestId::from(request_id), payload.duration_secs)
        .await?;

    Ok(Json(record))
}

async fn presence_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PresenceResponse>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    let online = state.registry().is_online(UserId::from(user_id)).await;
    Ok(Json(PresenceResponse { user_id, online }))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// 连接守门人：握手阶段完成认证，任何领域事件处理接线之前。
///
/// 三种情况拒绝连接：凭证缺失、签名校验失败、token 指向的
/// 用户在用户库里不存在。通过后把解析出的身份附到连接上。
async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = crate::auth::token_from_handshake(query.token.as_deref(), &headers)
        .ok_or_else(|| ApiError::unauthorized("Missing connection token"))?;

    let claims = state.jwt_service.verify_token(&token)?;
    let user_id = UserId::from(claims.user_id);

    let account = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Failed to look up user during handshake");
            ApiError::internal_server_error("Failed to establish connection")
        })?
        .ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "WebSocket handshake with unknown user");
            ApiError::unauthorized("Unknown user")
        })?;

    tracing::info!(user_id = %account.id, "WebSocket upgrade authenticated");

    Ok(ws.on_upgrade(move |socket| WebSocketConnection::new(socket, state, account).run()))
}
