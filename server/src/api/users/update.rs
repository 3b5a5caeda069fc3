use crate::api::{field_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::{DbConn, DbPool};
use crate::images;
use crate::models::User;
use crate::representations::{user_response, UserResponse};
use crate::schema::users;
use crate::validation::validate_person_name;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Optional avatar as a base64 data URI
    pub avatar: Option<String>,
}

pub(crate) enum UpdateRejection {
    Field(&'static str, String),
    Db,
}

impl UpdateRejection {
    pub(crate) fn into_response(self) -> Response {
        match self {
            UpdateRejection::Field(field, message) => field_error(field, &message),
            UpdateRejection::Db => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update profile".to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct ProfileChanges<'a> {
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
    avatar: Option<&'a str>,
    updated_at: chrono::DateTime<Utc>,
}

/// Applies a profile update to `target`. Full updates (PUT) require both name
/// fields; partial updates (PATCH) touch only what is present.
pub(crate) fn apply_profile_update(
    conn: &mut DbConn,
    target: &User,
    req: &UpdateProfileRequest,
    partial: bool,
) -> Result<User, UpdateRejection> {
    if !partial {
        if req.first_name.is_none() {
            return Err(UpdateRejection::Field(
                "first_name",
                "This field is required.".to_string(),
            ));
        }
        if req.last_name.is_none() {
            return Err(UpdateRejection::Field(
                "last_name",
                "This field is required.".to_string(),
            ));
        }
    }

    let first_name = match &req.first_name {
        Some(value) => Some(
            validate_person_name(value)
                .map_err(|msg| UpdateRejection::Field("first_name", msg))?,
        ),
        None => None,
    };
    let last_name = match &req.last_name {
        Some(value) => Some(
            validate_person_name(value).map_err(|msg| UpdateRejection::Field("last_name", msg))?,
        ),
        None => None,
    };

    let avatar = match &req.avatar {
        Some(data_uri) => Some(
            images::save_data_uri("users/avatars", data_uri)
                .map_err(|msg| UpdateRejection::Field("avatar", msg))?,
        ),
        None => None,
    };

    let changes = ProfileChanges {
        first_name: first_name.as_deref(),
        last_name: last_name.as_deref(),
        avatar: avatar.as_deref(),
        updated_at: Utc::now(),
    };

    let updated: User = diesel::update(users::table.find(target.id))
        .set(&changes)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| {
            tracing::error!("Failed to update user {}: {}", target.id, e);
            UpdateRejection::Db
        })?;

    // The old avatar file is unreferenced once the column points elsewhere.
    if avatar.is_some() {
        if let Some(old) = &target.avatar {
            images::delete_media(old);
        }
    }

    Ok(updated)
}

fn update_user_inner(
    user: User,
    pool: Arc<DbPool>,
    id: Uuid,
    req: UpdateProfileRequest,
    partial: bool,
) -> Response {
    if user.id != id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "You can only modify your own profile".to_string(),
            }),
        )
            .into_response();
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database connection failed".to_string(),
                }),
            )
                .into_response()
        }
    };

    let updated = match apply_profile_update(&mut conn, &user, &req, partial) {
        Ok(u) => u,
        Err(rejection) => return rejection.into_response(),
    };

    match user_response(&mut conn, &updated, Some(&updated)) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Failed to shape user: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch user".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the profile owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn put_user(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    update_user_inner(user, pool, id, req, false)
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the profile owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_user(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    update_user_inner(user, pool, id, req, true)
}
