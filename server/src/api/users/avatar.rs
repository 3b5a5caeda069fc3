use crate::api::{field_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::images;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// Avatar image as a base64 data URI
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    tag = "users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Missing or undecodable avatar"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn put_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<AvatarRequest>,
) -> impl IntoResponse {
    let Some(data_uri) = req.avatar else {
        return field_error("avatar", "This field is required.");
    };

    let relative_path = match images::save_data_uri("users/avatars", &data_uri) {
        Ok(p) => p,
        Err(msg) => return field_error("avatar", &msg),
    };

    let mut conn = get_conn!(pool);

    let result = diesel::update(users::table.find(user.id))
        .set((
            users::avatar.eq(&relative_path),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn);

    if let Err(e) = result {
        tracing::error!("Failed to store avatar for {}: {}", user.id, e);
        images::delete_media(&relative_path);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to store avatar".to_string(),
            }),
        )
            .into_response();
    }

    if let Some(old) = &user.avatar {
        images::delete_media(old);
    }

    (
        StatusCode::OK,
        Json(AvatarResponse {
            avatar: images::media_url(&relative_path),
        }),
    )
        .into_response()
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let result = diesel::update(users::table.find(user.id))
        .set((
            users::avatar.eq(None::<String>),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn);

    if let Err(e) = result {
        tracing::error!("Failed to clear avatar for {}: {}", user.id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to remove avatar".to_string(),
            }),
        )
            .into_response();
    }

    if let Some(old) = &user.avatar {
        images::delete_media(old);
    }

    StatusCode::NO_CONTENT.into_response()
}
