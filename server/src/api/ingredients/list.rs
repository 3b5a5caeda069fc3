use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Ingredient;
use crate::representations::IngredientResponse;
use crate::schema::ingredients;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix filter
    pub name: Option<String>,
}

/// Escapes LIKE wildcards so a literal prefix match is performed.
fn prefix_pattern(prefix: &str) -> String {
    format!(
        "{}%",
        prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
    )
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Matching ingredients", body = [IngredientResponse])
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListIngredientsParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let mut query = ingredients::table.into_boxed();
    if let Some(prefix) = params.name.as_deref() {
        query = query.filter(ingredients::name.ilike(prefix_pattern(prefix)));
    }

    let all: Vec<Ingredient> = match query
        .order(ingredients::name.asc())
        .select(Ingredient::as_select())
        .load(&mut conn)
    {
        Ok(i) => i,
        Err(e) => {
            tracing::error!("Failed to fetch ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch ingredients".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response: Vec<IngredientResponse> =
        all.into_iter().map(IngredientResponse::from).collect();
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("salt"), "salt%");
        assert_eq!(prefix_pattern("100%"), "100\\%%");
        assert_eq!(prefix_pattern("a_b"), "a\\_b%");
    }
}
