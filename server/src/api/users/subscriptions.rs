use crate::api::{ErrorResponse, PaginationMetadata};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::representations::{user_with_recipes, UserWithRecipesResponse};
use crate::schema::{subscriptions, users};
use crate::validation::{DEFAULT_RECIPES_LIMIT, MAX_RECIPES_LIMIT};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionsParams {
    /// Number of authors to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Number of authors to skip (default: 0)
    pub offset: Option<i64>,
    /// Number of embedded recipes per author (default: 3, max: 100)
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionsResponse {
    pub authors: Vec<UserWithRecipesResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Subscribed authors with recent recipes", body = SubscriptionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<SubscriptionsParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let recipes_limit = params
        .recipes_limit
        .unwrap_or(DEFAULT_RECIPES_LIMIT)
        .clamp(0, MAX_RECIPES_LIMIT);

    let mut conn = get_conn!(pool);

    let total: i64 = match subscriptions::table
        .filter(subscriptions::user_id.eq(user.id))
        .count()
        .get_result(&mut conn)
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to count subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response();
        }
    };

    let authors: Vec<User> = match subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::author_id)))
        .filter(subscriptions::user_id.eq(user.id))
        .order(subscriptions::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(User::as_select())
        .load(&mut conn)
    {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        match user_with_recipes(&mut conn, author, Some(&user), recipes_limit) {
            Ok(entry) => results.push(entry),
            Err(e) => {
                tracing::error!("Failed to shape subscription entry: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch subscriptions".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(SubscriptionsResponse {
            authors: results,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}
