use crate::api::{field_error, ErrorResponse};
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::users;
use crate::validation::validate_password;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/users/set_password",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_password(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<SetPasswordRequest>,
) -> impl IntoResponse {
    let Some(current_password) = req.current_password else {
        return field_error("current_password", "This field is required.");
    };
    let Some(new_password) = req.new_password else {
        return field_error("new_password", "This field is required.");
    };

    if !verify_password(&current_password, &user.password_hash) {
        return field_error("current_password", "Wrong password.");
    }

    if let Err(msg) = validate_password(&new_password) {
        return field_error("new_password", &msg);
    }

    let password_hash = match hash_password(&new_password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to hash password".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut conn = get_conn!(pool);

    let result = diesel::update(users::table.find(user.id))
        .set((
            users::password_hash.eq(&password_hash),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn);

    if let Err(e) = result {
        tracing::error!("Failed to change password for {}: {}", user.id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to change password".to_string(),
            }),
        )
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
