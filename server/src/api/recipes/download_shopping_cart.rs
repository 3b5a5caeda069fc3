use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{ingredients, recipe_ingredients, shopping_cart};
use crate::shopping_list;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Aggregated shopping list as a plain-text attachment",
         content_type = "text/plain"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn download_shopping_cart(
    State(pool): State<Arc<DbPool>>,
    AuthUser(user): AuthUser,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    // Deterministic input order: cart entries oldest first, then the
    // ingredient rows of each recipe in insertion order. The aggregator
    // keeps first-seen order for the output.
    let rows: Vec<(String, String, i32)> = match shopping_cart::table
        .inner_join(
            recipe_ingredients::table
                .on(recipe_ingredients::recipe_id.eq(shopping_cart::recipe_id)),
        )
        .inner_join(
            ingredients::table.on(ingredients::id.eq(recipe_ingredients::ingredient_id)),
        )
        .filter(shopping_cart::user_id.eq(user.id))
        .order((shopping_cart::created_at.asc(), recipe_ingredients::id.asc()))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch shopping cart contents: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    let body = shopping_list::render(&shopping_list::aggregate(rows));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        body,
    )
        .into_response()
}
