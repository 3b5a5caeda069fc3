use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

fn site_url() -> String {
    std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Short link for the recipe", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_link(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match recipes::table
        .find(id)
        .select(recipes::short_code)
        .first::<String>(&mut conn)
    {
        Ok(code) => (
            StatusCode::OK,
            Json(ShortLinkResponse {
                short_link: format!("{}/s/{}", site_url().trim_end_matches('/'), code),
            }),
        )
            .into_response(),
        Err(diesel::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build short link".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Handler for /s/{code}: redirects a short link to the canonical recipe URL.
pub async fn resolve_short_link(
    State(pool): State<Arc<DbPool>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match recipes::table
        .filter(recipes::short_code.eq(&code))
        .select(recipes::id)
        .first::<Uuid>(&mut conn)
    {
        Ok(id) => Redirect::temporary(&format!("/api/recipes/{}", id)).into_response(),
        Err(diesel::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Unknown short link".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to resolve short link: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to resolve short link".to_string(),
                }),
            )
                .into_response()
        }
    }
}
