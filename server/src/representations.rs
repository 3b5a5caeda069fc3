//! Read-side payload shaping. Stored rows and response payloads are distinct
//! shapes: recipes embed their author, full tag objects, flattened ingredient
//! rows and two per-viewer flags; users carry `is_subscribed` relative to the
//! viewer. Anonymous viewers always see every flag as false.

use crate::db::DbConn;
use crate::images;
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart, subscriptions,
    users,
};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        TagResponse {
            id: tag.id,
            name: tag.name,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        IngredientResponse {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

/// Ingredient row flattened with name/unit from the catalog entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Catalog ingredient id
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub author: UserResponse,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
}

/// Short form used by favorite/shopping-cart responses and embedded author
/// recipe lists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithRecipesResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

fn avatar_url(user: &User) -> Option<String> {
    user.avatar.as_deref().map(images::media_url)
}

/// True iff an authenticated viewer is subscribed to the target. Anonymous
/// viewers and self-views are always false.
fn is_subscribed(conn: &mut DbConn, viewer: Option<&User>, author_id: Uuid) -> QueryResult<bool> {
    let Some(viewer) = viewer else {
        return Ok(false);
    };
    if viewer.id == author_id {
        return Ok(false);
    }
    diesel::select(diesel::dsl::exists(
        subscriptions::table
            .filter(subscriptions::user_id.eq(viewer.id))
            .filter(subscriptions::author_id.eq(author_id)),
    ))
    .get_result(conn)
}

pub fn user_response(
    conn: &mut DbConn,
    user: &User,
    viewer: Option<&User>,
) -> QueryResult<UserResponse> {
    let subscribed = is_subscribed(conn, viewer, user.id)?;
    Ok(UserResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        avatar: avatar_url(user),
        is_subscribed: subscribed,
    })
}

/// Batch form of [`user_response`] for list pages: one subscription query for
/// the whole page.
pub fn user_responses(
    conn: &mut DbConn,
    list: &[User],
    viewer: Option<&User>,
) -> QueryResult<Vec<UserResponse>> {
    let ids: Vec<Uuid> = list.iter().map(|u| u.id).collect();

    let subscribed: HashSet<Uuid> = match viewer {
        Some(viewer) => subscriptions::table
            .filter(subscriptions::user_id.eq(viewer.id))
            .filter(subscriptions::author_id.eq_any(&ids))
            .select(subscriptions::author_id)
            .load::<Uuid>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    Ok(list
        .iter()
        .map(|user| UserResponse {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            avatar: avatar_url(user),
            is_subscribed: viewer
                .map(|v| v.id != user.id && subscribed.contains(&user.id))
                .unwrap_or(false),
        })
        .collect())
}

pub fn recipe_summary(recipe: &Recipe) -> RecipeSummary {
    RecipeSummary {
        id: recipe.id,
        name: recipe.name.clone(),
        image: images::media_url(&recipe.image),
        cooking_time: recipe.cooking_time,
    }
}

pub fn recipe_response(
    conn: &mut DbConn,
    recipe: &Recipe,
    viewer: Option<&User>,
) -> QueryResult<RecipeResponse> {
    let mut responses = recipe_responses(conn, std::slice::from_ref(recipe), viewer)?;
    Ok(responses.remove(0))
}

/// Batch builder: one query per association for the whole page instead of one
/// set of queries per recipe.
pub fn recipe_responses(
    conn: &mut DbConn,
    list: &[Recipe],
    viewer: Option<&User>,
) -> QueryResult<Vec<RecipeResponse>> {
    if list.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = list.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = list.iter().map(|r| r.author_id).collect();

    let authors: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let subscribed_authors: HashSet<Uuid> = match viewer {
        Some(viewer) => subscriptions::table
            .filter(subscriptions::user_id.eq(viewer.id))
            .filter(subscriptions::author_id.eq_any(&author_ids))
            .select(subscriptions::author_id)
            .load::<Uuid>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let mut tags_by_recipe: HashMap<Uuid, Vec<TagResponse>> = HashMap::new();
    let tag_rows: Vec<(Uuid, Tag)> = recipe_tags::table
        .inner_join(crate::schema::tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .order(crate::schema::tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag.into());
    }

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<RecipeIngredientResponse>> = HashMap::new();
    let ingredient_rows: Vec<(Uuid, Uuid, String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .order(ingredients::name.asc())
        .select((
            recipe_ingredients::recipe_id,
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;
    for (recipe_id, id, name, measurement_unit, amount) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id,
                name,
                measurement_unit,
                amount,
            });
    }

    let favorited: HashSet<Uuid> = match viewer {
        Some(viewer) => favorites::table
            .filter(favorites::user_id.eq(viewer.id))
            .filter(favorites::recipe_id.eq_any(&recipe_ids))
            .select(favorites::recipe_id)
            .load::<Uuid>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let in_cart: HashSet<Uuid> = match viewer {
        Some(viewer) => shopping_cart::table
            .filter(shopping_cart::user_id.eq(viewer.id))
            .filter(shopping_cart::recipe_id.eq_any(&recipe_ids))
            .select(shopping_cart::recipe_id)
            .load::<Uuid>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let mut responses = Vec::with_capacity(list.len());
    for recipe in list {
        let author = authors
            .get(&recipe.author_id)
            .ok_or(diesel::result::Error::NotFound)?;
        let author_subscribed = viewer
            .map(|v| v.id != author.id && subscribed_authors.contains(&author.id))
            .unwrap_or(false);

        responses.push(RecipeResponse {
            id: recipe.id,
            author: UserResponse {
                id: author.id,
                username: author.username.clone(),
                first_name: author.first_name.clone(),
                last_name: author.last_name.clone(),
                email: author.email.clone(),
                avatar: avatar_url(author),
                is_subscribed: author_subscribed,
            },
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            ingredients: ingredients_by_recipe
                .remove(&recipe.id)
                .unwrap_or_default(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name.clone(),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
            image: images::media_url(&recipe.image),
        });
    }

    Ok(responses)
}

/// Profile plus the author's most recent recipes in summary form.
/// `recipes_limit` is clamped to [0, 100]; default 3.
pub fn user_with_recipes(
    conn: &mut DbConn,
    user: &User,
    viewer: Option<&User>,
    recipes_limit: i64,
) -> QueryResult<UserWithRecipesResponse> {
    let subscribed = is_subscribed(conn, viewer, user.id)?;

    let recent: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq(user.id))
        .order(recipes::created_at.desc())
        .limit(recipes_limit)
        .select(Recipe::as_select())
        .load(conn)?;

    let recipes_count: i64 = recipes::table
        .filter(recipes::author_id.eq(user.id))
        .count()
        .get_result(conn)?;

    Ok(UserWithRecipesResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        avatar: avatar_url(user),
        is_subscribed: subscribed,
        recipes: recent.iter().map(recipe_summary).collect(),
        recipes_count,
    })
}
