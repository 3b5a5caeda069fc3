use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewSubscription, User};
use crate::representations::{user_with_recipes, UserWithRecipesResponse};
use crate::schema::{subscriptions, users};
use crate::validation::{DEFAULT_RECIPES_LIMIT, MAX_RECIPES_LIMIT};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecipesLimitParams {
    /// Number of embedded recipes per author (default: 3, max: 100)
    pub recipes_limit: Option<i64>,
}

impl RecipesLimitParams {
    pub fn recipes_limit(&self) -> i64 {
        self.recipes_limit
            .unwrap_or(DEFAULT_RECIPES_LIMIT)
            .clamp(0, MAX_RECIPES_LIMIT)
    }
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(("id" = Uuid, Path, description = "Author ID"), RecipesLimitParams),
    responses(
        (status = 201, description = "Subscribed", body = UserWithRecipesResponse),
        (status = 400, description = "Self-subscription or already subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Query(params): Query<RecipesLimitParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    // Checked before the existence lookup so self-subscription always fails
    // the same way.
    if id == user.id {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "You cannot subscribe to yourself.".to_string(),
            }),
        )
            .into_response();
    }

    let author: User = match users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "User not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let new_subscription = NewSubscription {
        user_id: user.id,
        author_id: author.id,
    };

    // The unique constraint on (user_id, author_id) is the real guard; no
    // advisory pre-check needed when the insert reports the violation.
    match diesel::insert_into(subscriptions::table)
        .values(&new_subscription)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "You are already subscribed to this user.".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create subscription: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to subscribe".to_string(),
                }),
            )
                .into_response();
        }
    }

    match user_with_recipes(&mut conn, &author, Some(&user), params.recipes_limit()) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Failed to shape subscription response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscription".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user.id))
            .filter(subscriptions::author_id.eq(id)),
    )
    .execute(&mut conn);

    match deleted {
        Ok(0) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "You are not subscribed to this user.".to_string(),
            }),
        )
            .into_response(),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to delete subscription: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to unsubscribe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
