use crate::api::recipes::create::component_error_response;
use crate::api::recipes::{
    replace_components, validate_ingredient_entries, validate_tag_entries, IngredientAmount,
};
use crate::api::{field_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::images;
use crate::models::Recipe;
use crate::representations::{recipe_response, RecipeResponse};
use crate::schema::recipes;
use crate::validation::{validate_cooking_time, MAX_RECIPE_NAME_LENGTH};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<Uuid>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
struct RecipeChanges {
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
    image: Option<String>,
    updated_at: chrono::DateTime<Utc>,
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn put_recipe(
    State(pool): State<Arc<DbPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    update_recipe_inner(pool, user, id, request, false).await
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn patch_recipe(
    State(pool): State<Arc<DbPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    update_recipe_inner(pool, user, id, request, true).await
}

async fn update_recipe_inner(
    pool: Arc<DbPool>,
    user: crate::models::User,
    id: Uuid,
    request: UpdateRecipeRequest,
    partial: bool,
) -> axum::response::Response {
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
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if recipe.author_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only the author can modify this recipe.".to_string(),
            }),
        )
            .into_response();
    }

    // Full replacement requires the component lists; partial updates may omit
    // them to leave the existing links untouched.
    if !partial && request.ingredients.is_none() {
        return field_error("ingredients", "This field is required.");
    }
    if !partial && request.tags.is_none() {
        return field_error("tags", "This field is required.");
    }

    if let Some(entries) = request.ingredients.as_deref() {
        if let Err(e) = validate_ingredient_entries(&mut conn, entries) {
            return component_error_response("ingredients", e);
        }
    }
    if let Some(tag_ids) = request.tags.as_deref() {
        if let Err(e) = validate_tag_entries(&mut conn, tag_ids) {
            return component_error_response("tags", e);
        }
    }

    let name = match request.name.as_deref().map(str::trim) {
        None => None,
        Some("") => return field_error("name", "This field cannot be empty."),
        Some(name) if name.chars().count() > MAX_RECIPE_NAME_LENGTH => {
            return field_error("name", "Recipe name is too long.");
        }
        Some(name) => Some(name.to_string()),
    };

    let text = match request.text.as_deref().map(str::trim) {
        None => None,
        Some("") => return field_error("text", "This field cannot be empty."),
        Some(text) => Some(text.to_string()),
    };

    if let Some(cooking_time) = request.cooking_time {
        if let Err(message) = validate_cooking_time(cooking_time) {
            return field_error("cooking_time", &message);
        }
    }

    let new_image = match request.image.as_deref() {
        None => None,
        Some(data) => match images::save_data_uri("recipes/images", data) {
            Ok(path) => Some(path),
            Err(message) => return field_error("image", &message),
        },
    };

    let changes = RecipeChanges {
        name,
        text,
        cooking_time: request.cooking_time,
        image: new_image.clone(),
        updated_at: Utc::now(),
    };

    let saved: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let updated: Recipe = diesel::update(recipes::table.find(recipe.id))
            .set(&changes)
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        if let Some(entries) = request.ingredients.as_deref() {
            let tag_ids = request.tags.as_deref().unwrap_or(&[]);
            if request.tags.is_some() {
                replace_components(conn, recipe.id, entries, tag_ids)?;
            } else {
                replace_ingredients_only(conn, recipe.id, entries)?;
            }
        } else if let Some(tag_ids) = request.tags.as_deref() {
            replace_tags_only(conn, recipe.id, tag_ids)?;
        }
        Ok(updated)
    });

    let updated = match saved {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(path) = new_image.as_deref() {
                images::delete_media(path);
            }
            tracing::error!("Failed to update recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if new_image.is_some() {
        images::delete_media(&recipe.image);
    }

    match recipe_response(&mut conn, &updated, Some(&user)) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Failed to shape recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn replace_ingredients_only(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    entries: &[IngredientAmount],
) -> Result<(), diesel::result::Error> {
    use crate::models::NewRecipeIngredient;
    use crate::schema::recipe_ingredients;

    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;
    let rows: Vec<NewRecipeIngredient> = entries
        .iter()
        .map(|e| NewRecipeIngredient {
            recipe_id,
            ingredient_id: e.id,
            amount: e.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn replace_tags_only(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), diesel::result::Error> {
    use crate::models::NewRecipeTag;
    use crate::schema::recipe_tags;

    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)?;
    let rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}
