use crate::api::{field_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewFavorite, Recipe};
use crate::representations::{recipe_summary, RecipeSummary};
use crate::schema::{favorites, recipes};
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
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Recipe added to favorites", body = RecipeSummary),
        (status = 400, description = "Already in favorites"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn add_favorite(
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
                    error: "Failed to update favorites".to_string(),
                }),
            )
                .into_response();
        }
    };

    // The unique constraint is the arbiter; no pre-check, so concurrent
    // requests cannot both succeed.
    match diesel::insert_into(favorites::table)
        .values(&NewFavorite {
            user_id: user.id,
            recipe_id: recipe.id,
        })
        .execute(&mut conn)
    {
        Ok(_) => (StatusCode::CREATED, Json(recipe_summary(&recipe))).into_response(),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            field_error("errors", "Recipe is already in favorites.")
        }
        Err(e) => {
            tracing::error!("Failed to add favorite: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update favorites".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Recipe removed from favorites"),
        (status = 400, description = "Not in favorites"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn remove_favorite(
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
                    error: "Failed to update favorites".to_string(),
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
        favorites::table
            .filter(favorites::user_id.eq(user.id))
            .filter(favorites::recipe_id.eq(id)),
    )
    .execute(&mut conn)
    {
        Ok(0) => field_error("errors", "Recipe is not in favorites."),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to remove favorite: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update favorites".to_string(),
                }),
            )
                .into_response()
        }
    }
}
