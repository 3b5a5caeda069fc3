use crate::api::{ErrorResponse, PageParams, PaginationMetadata};
use crate::auth::MaybeUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::representations::{user_responses, UserResponse};
use crate::schema::users;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "List of users", body = ListUsersResponse)
    )
)]
pub async fn list_users(
    MaybeUser(viewer): MaybeUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let limit = params.limit();
    let offset = params.offset();

    let mut conn = get_conn!(pool);

    let total: i64 = match users::table.count().get_result(&mut conn) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to count users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let page: Vec<User> = match users::table
        .order(users::created_at.asc())
        .limit(limit)
        .offset(offset)
        .select(User::as_select())
        .load(&mut conn)
    {
        Ok(u) => u,
        Err(e) => {
            tracing::error!("Failed to fetch users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let users = match user_responses(&mut conn, &page, viewer.as_ref()) {
        Ok(u) => u,
        Err(e) => {
            tracing::error!("Failed to shape users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(ListUsersResponse {
            users,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}
