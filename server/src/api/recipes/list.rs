use crate::api::{ErrorResponse, PaginationMetadata};
use crate::auth::MaybeUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::representations::{recipe_responses, RecipeResponse};
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart, tags};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::Query;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Number of items to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
    /// Only recipes by this author
    pub author: Option<Uuid>,
    /// Only recipes carrying at least one of these tag slugs (repeatable)
    #[serde(default)]
    pub tags: Vec<String>,
    /// "1" restricts to the viewer's favorites; ignored for anonymous viewers
    pub is_favorited: Option<String>,
    /// "1" restricts to the viewer's shopping cart; ignored for anonymous viewers
    pub is_in_shopping_cart: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: PaginationMetadata,
}

/// Builds the filtered base query. Called twice per request, once for the
/// count and once for the page, so it hands back a fresh boxed query each
/// time.
fn filtered(params: &ListRecipesParams, viewer_id: Option<Uuid>) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if !params.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(params.tags.clone()))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }

    if let Some(viewer_id) = viewer_id {
        if params.is_favorited.as_deref() == Some("1") {
            let favorited = favorites::table
                .filter(favorites::user_id.eq(viewer_id))
                .select(favorites::recipe_id);
            query = query.filter(recipes::id.eq_any(favorited));
        }
        if params.is_in_shopping_cart.as_deref() == Some("1") {
            let in_cart = shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer_id))
                .select(shopping_cart::recipe_id);
            query = query.filter(recipes::id.eq_any(in_cart));
        }
    }

    query
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Page of recipes, newest first", body = ListRecipesResponse)
    )
)]
pub async fn list_recipes(
    State(pool): State<Arc<DbPool>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let viewer_id = viewer.as_ref().map(|u| u.id);

    let total: i64 = match filtered(&params, viewer_id).count().get_result(&mut conn) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to count recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let page: Vec<Recipe> = match filtered(&params, viewer_id)
        .order(recipes::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Recipe::as_select())
        .load(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let recipes = match recipe_responses(&mut conn, &page, viewer.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to shape recipe page: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(ListRecipesResponse {
            recipes,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}
