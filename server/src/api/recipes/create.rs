use crate::api::recipes::{
    generate_short_code, replace_components, validate_ingredient_entries, validate_tag_entries,
    ComponentError, IngredientAmount,
};
use crate::api::{field_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::images;
use crate::models::{NewRecipe, Recipe};
use crate::representations::{recipe_response, RecipeResponse};
use crate::schema::recipes;
use crate::validation::{validate_cooking_time, MAX_RECIPE_NAME_LENGTH};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<Uuid>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn create_recipe(
    State(pool): State<Arc<DbPool>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let Some(ingredient_entries) = request.ingredients else {
        return field_error("ingredients", "This field is required.");
    };
    if let Err(e) = validate_ingredient_entries(&mut conn, &ingredient_entries) {
        return component_error_response("ingredients", e);
    }

    let Some(tag_ids) = request.tags else {
        return field_error("tags", "This field is required.");
    };
    if let Err(e) = validate_tag_entries(&mut conn, &tag_ids) {
        return component_error_response("tags", e);
    }

    let name = match request.name.as_deref().map(str::trim) {
        None | Some("") => return field_error("name", "This field is required."),
        Some(name) if name.chars().count() > MAX_RECIPE_NAME_LENGTH => {
            return field_error("name", "Recipe name is too long.");
        }
        Some(name) => name.to_string(),
    };

    let text = match request.text.as_deref().map(str::trim) {
        None | Some("") => return field_error("text", "This field is required."),
        Some(text) => text.to_string(),
    };

    let Some(cooking_time) = request.cooking_time else {
        return field_error("cooking_time", "This field is required.");
    };
    if let Err(message) = validate_cooking_time(cooking_time) {
        return field_error("cooking_time", &message);
    }

    let Some(image_data) = request.image.as_deref() else {
        return field_error("image", "This field is required.");
    };
    let image_path = match images::save_data_uri("recipes/images", image_data) {
        Ok(path) => path,
        Err(message) => return field_error("image", &message),
    };

    let short_code = generate_short_code();
    let new_recipe = NewRecipe {
        author_id: user.id,
        name: &name,
        text: &text,
        cooking_time,
        image: &image_path,
        short_code: &short_code,
    };

    let created: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        replace_components(conn, recipe.id, &ingredient_entries, &tag_ids)?;
        Ok(recipe)
    });

    let recipe = match created {
        Ok(recipe) => recipe,
        Err(e) => {
            images::delete_media(&image_path);
            tracing::error!("Failed to create recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match recipe_response(&mut conn, &recipe, Some(&user)) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Failed to shape recipe: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub(crate) fn component_error_response(
    field: &str,
    error: ComponentError,
) -> axum::response::Response {
    match error {
        ComponentError::Invalid(message) => field_error(field, &message),
        ComponentError::Db(e) => {
            tracing::error!("Failed to validate {}: {}", field, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to save recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
