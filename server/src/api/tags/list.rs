use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Tag;
use crate::representations::TagResponse;
use crate::schema::tags;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    responses(
        (status = 200, description = "All tags", body = [TagResponse])
    )
)]
pub async fn list_tags(State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let all: Vec<Tag> = match tags::table
        .order(tags::name.asc())
        .select(Tag::as_select())
        .load(&mut conn)
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to fetch tags: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch tags".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response: Vec<TagResponse> = all.into_iter().map(TagResponse::from).collect();
    (StatusCode::OK, Json(response)).into_response()
}
