use crate::api::ErrorResponse;
use crate::auth::{delete_session, AuthUser};
use crate::db::DbPool;
use crate::get_conn;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/token/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    AuthUser(_user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // AuthUser already proved the header exists and the token resolves.
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .unwrap_or_default();

    let mut conn = get_conn!(pool);

    if let Err(e) = delete_session(&mut conn, token) {
        tracing::error!("Failed to delete session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to delete session".to_string(),
            }),
        )
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
