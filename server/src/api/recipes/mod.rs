pub mod create;
pub mod delete;
pub mod download_shopping_cart;
pub mod favorite;
pub mod get;
pub mod get_link;
pub mod list;
pub mod shopping_cart;
pub mod update;

use crate::models::{NewRecipeIngredient, NewRecipeTag};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, tags};
use crate::validation::validate_ingredient_amount;
use crate::AppState;
use axum::routing::get;
use axum::Router;
use diesel::prelude::*;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list::list_recipes).post(create::create_recipe),
        )
        .route(
            "/download_shopping_cart",
            get(download_shopping_cart::download_shopping_cart),
        )
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::put_recipe)
                .patch(update::patch_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/{id}/favorite",
            axum::routing::post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
        .route(
            "/{id}/shopping_cart",
            axum::routing::post(shopping_cart::add_to_cart)
                .delete(shopping_cart::remove_from_cart),
        )
        .route("/{id}/get-link", get(get_link::get_link))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::put_recipe,
        update::patch_recipe,
        delete::delete_recipe,
        favorite::add_favorite,
        favorite::remove_favorite,
        shopping_cart::add_to_cart,
        shopping_cart::remove_from_cart,
        download_shopping_cart::download_shopping_cart,
        get_link::get_link,
    ),
    components(schemas(
        IngredientAmount,
        list::ListRecipesResponse,
        create::CreateRecipeRequest,
        update::UpdateRecipeRequest,
        get_link::ShortLinkResponse,
    ))
)]
pub struct ApiDoc;

/// One (catalog ingredient, amount) pair in a recipe write request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

const SHORT_CODE_LENGTH: usize = 8;

pub(crate) fn generate_short_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_CODE_LENGTH)
        .map(char::from)
        .collect()
}

fn has_duplicates(ids: impl IntoIterator<Item = Uuid>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().any(|id| !seen.insert(id))
}

pub(crate) enum ComponentError {
    Invalid(String),
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for ComponentError {
    fn from(e: diesel::result::Error) -> Self {
        ComponentError::Db(e)
    }
}

/// Validates the `ingredients` list of a write request: non-empty, no
/// duplicate ids, amounts in range, every id present in the catalog.
pub(crate) fn validate_ingredient_entries(
    conn: &mut PgConnection,
    entries: &[IngredientAmount],
) -> Result<(), ComponentError> {
    if entries.is_empty() {
        return Err(ComponentError::Invalid(
            "At least one ingredient is required.".to_string(),
        ));
    }
    if has_duplicates(entries.iter().map(|e| e.id)) {
        return Err(ComponentError::Invalid(
            "Ingredients must not repeat.".to_string(),
        ));
    }
    for entry in entries {
        validate_ingredient_amount(entry.amount).map_err(ComponentError::Invalid)?;
    }

    let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
    let known: i64 = ingredients::table
        .filter(ingredients::id.eq_any(&ids))
        .count()
        .get_result(conn)?;
    if known != ids.len() as i64 {
        return Err(ComponentError::Invalid(
            "Unknown ingredient id.".to_string(),
        ));
    }

    Ok(())
}

/// Validates the `tags` list of a write request: non-empty, no duplicates,
/// every id known.
pub(crate) fn validate_tag_entries(
    conn: &mut PgConnection,
    tag_ids: &[Uuid],
) -> Result<(), ComponentError> {
    if tag_ids.is_empty() {
        return Err(ComponentError::Invalid(
            "At least one tag is required.".to_string(),
        ));
    }
    if has_duplicates(tag_ids.iter().copied()) {
        return Err(ComponentError::Invalid("Tags must not repeat.".to_string()));
    }

    let known: i64 = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .count()
        .get_result(conn)?;
    if known != tag_ids.len() as i64 {
        return Err(ComponentError::Invalid("Unknown tag id.".to_string()));
    }

    Ok(())
}

/// Fully replaces a recipe's tag links and ingredient rows
/// (delete-then-reinsert). Runs inside the caller's transaction.
pub(crate) fn replace_components(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    entries: &[IngredientAmount],
    tag_ids: &[Uuid],
) -> Result<(), diesel::result::Error> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    let ingredient_rows: Vec<NewRecipeIngredient> = entries
        .iter()
        .map(|e| NewRecipeIngredient {
            recipe_id,
            ingredient_id: e.id,
            amount: e.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&ingredient_rows)
        .execute(conn)?;

    let tag_rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&tag_rows)
        .execute(conn)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(!has_duplicates(vec![a, b]));
        assert!(has_duplicates(vec![a, b, a]));
        assert!(!has_duplicates(vec![]));
    }

    #[test]
    fn test_short_code_shape() {
        let code = generate_short_code();
        assert_eq!(code.len(), SHORT_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_short_codes_differ() {
        assert_ne!(generate_short_code(), generate_short_code());
    }
}
