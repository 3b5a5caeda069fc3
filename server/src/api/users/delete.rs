use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::images;
use crate::schema::users;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the profile owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if user.id != id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "You can only delete your own profile".to_string(),
            }),
        )
            .into_response();
    }

    let mut conn = get_conn!(pool);

    // Recipes, sessions and join rows go with the user via FK cascades.
    match diesel::delete(users::table.find(id)).execute(&mut conn) {
        Ok(_) => {
            if let Some(avatar) = &user.avatar {
                images::delete_media(avatar);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::error!("Failed to delete user {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to delete user".to_string(),
                }),
            )
                .into_response()
        }
    }
}
