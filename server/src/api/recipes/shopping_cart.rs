use crate::api::{field_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewShoppingCartEntry, Recipe};
use crate::representations::{recipe_summary, RecipeSummary};
use crate::schema::{recipes, shopping_cart};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Recipe added to shopping cart", body = RecipeSummary),
        (status = 400, description = "Already in shopping cart"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn add_to_cart(
    State(pool): State<Arc<DbPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let recipe: Recipe = match recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update shopping cart".to_string(),
                }),
            )
                .into_response();
        }
    };

    match diesel::insert_into(shopping_cart::table)
        .values(&NewShoppingCartEntry {
            user_id: user.id,
            recipe_id: recipe.id,
        })
        .execute(&mut conn)
    {
        Ok(_) => (StatusCode::CREATED, Json(recipe_summary(&recipe))).into_response(),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            field_error("errors", "Recipe is already in the shopping cart.")
        }
        Err(e) => {
            tracing::error!("Failed to add to shopping cart: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update shopping cart".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Recipe removed from shopping cart"),
        (status = 400, description = "Not in shopping cart"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn remove_from_cart(
    State(pool): State<Arc<DbPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let exists: bool = match diesel::select(diesel::dsl::exists(
        recipes::table.filter(recipes::id.eq(id)),
    ))
    .get_result(&mut conn)
    {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update shopping cart".to_string(),
                }),
            )
                .into_response();
        }
    };
    if !exists {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Recipe not found".to_string(),
            }),
        )
            .into_response();
    }

    match diesel::delete(
        shopping_cart::table
            .filter(shopping_cart::user_id.eq(user.id))
            .filter(shopping_cart::recipe_id.eq(id)),
    )
    .execute(&mut conn)
    {
        Ok(0) => field_error("errors", "Recipe is not in the shopping cart."),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to remove from shopping cart: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update shopping cart".to_string(),
                }),
            )
                .into_response()
        }
    }
}
