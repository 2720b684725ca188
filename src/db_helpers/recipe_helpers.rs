use std::collections::{HashMap, HashSet};

use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{
    data_formats::{
        IngredientAmount, RecipeDraft, RecipeFilter, RecipeIngredientResponse, RecipeResponse,
        TagResponse,
    },
    errors::{is_foreign_key_violation, is_unique_violation, FieldErrors, RequestError},
    models::{Recipe, RecipeIngredient, RecipeTag, ShortRecipe},
    pagination::PageParams,
};

use super::{bind_params, id_list, placeholders, recipe_flags, QueryBuilder, SqlParam};

const RECIPE_COLUMNS: &str = r#"
    recipes.id AS id,
    recipes.name AS name,
    recipes.text AS text,
    recipes.image AS image,
    recipes.cooking_time AS cooking_time,
    recipes.pub_date AS pub_date,
    users.id AS author_id,
    users.email AS author_email,
    users.username AS author_username,
    users.first_name AS author_first_name,
    users.last_name AS author_last_name"#;

const RECIPE_ORDER: &str = " ORDER BY recipes.pub_date DESC, recipes.id DESC";

/// Builds the `SELECT` for annotated recipe rows.
///
/// `conditions` is appended verbatim after the joins.
pub fn recipe_select(viewer: Option<i64>, conditions: &str) -> (String, Vec<SqlParam>) {
    let (flags, params) = recipe_flags(viewer);
    let query = format!(
        "SELECT {RECIPE_COLUMNS}{flags} FROM recipes JOIN users ON users.id = recipes.author_id{conditions}"
    );
    (query, params)
}

/// Builds the `WHERE` clause of the recipe listing.
///
/// The caller must have a viewer when asking for favorites or the shopping cart.
fn recipe_conditions(viewer: Option<i64>, filter: &RecipeFilter) -> (String, Vec<SqlParam>) {
    let viewer_id = viewer.unwrap_or_default();
    let tags_condition = format!(
        r#"EXISTS (SELECT 1 FROM recipe_tags
                   JOIN tags ON tags.id = recipe_tags.tag_id
                   WHERE recipe_tags.recipe_id = recipes.id AND tags.slug IN {})"#,
        placeholders(filter.tags.len())
    );
    QueryBuilder::new(" WHERE ", " AND ")
        .add_if(
            !filter.tags.is_empty(),
            &tags_condition,
            filter.tags.iter().cloned().map(SqlParam::Text),
        )
        .add_if(
            filter.author.is_some(),
            "recipes.author_id = ?",
            filter.author.map(SqlParam::Int),
        )
        .add_if(
            filter.is_favorited,
            "EXISTS (SELECT 1 FROM favorites WHERE favorites.recipe_id = recipes.id AND favorites.user_id = ?)",
            [SqlParam::Int(viewer_id)],
        )
        .add_if(
            filter.is_in_shopping_cart,
            "EXISTS (SELECT 1 FROM shopping_cart WHERE shopping_cart.recipe_id = recipes.id AND shopping_cart.user_id = ?)",
            [SqlParam::Int(viewer_id)],
        )
        .build()
}

pub async fn list_recipes_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    filter: &RecipeFilter,
    page: PageParams,
) -> Result<(Vec<RecipeResponse>, i64), RequestError> {
    // Nothing is favorited or in a cart for an anonymous viewer.
    if viewer.is_none() && (filter.is_favorited || filter.is_in_shopping_cart) {
        return Ok((vec![], 0));
    }

    let mut tx = pool.begin().await?;
    let (conditions, condition_params) = recipe_conditions(viewer, filter);

    let count_query = format!("SELECT COUNT(*) FROM recipes{conditions}");
    let (count,) = bind_params(
        sqlx::query_as::<Sqlite, (i64,)>(&count_query),
        condition_params.clone(),
    )
    .fetch_one(&mut tx)
    .await?;

    let (mut query, mut params) = recipe_select(viewer, &conditions);
    query.push_str(RECIPE_ORDER);
    query.push_str(" LIMIT ? OFFSET ?");
    params.extend(condition_params);
    params.push(SqlParam::Int(page.limit));
    params.push(SqlParam::Int(page.offset()));

    let recipes = bind_params(sqlx::query_as::<Sqlite, Recipe>(&query), params)
        .fetch_all(&mut tx)
        .await?;
    let recipes = attach_details(&mut tx, recipes).await?;
    tx.commit().await?;
    Ok((recipes, count))
}

pub async fn get_recipe_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    id: i64,
) -> Result<Option<RecipeResponse>, RequestError> {
    let mut tx = pool.begin().await?;
    let (query, mut params) = recipe_select(viewer, " WHERE recipes.id = ?");
    params.push(SqlParam::Int(id));
    let recipe = bind_params(sqlx::query_as::<Sqlite, Recipe>(&query), params)
        .fetch_optional(&mut tx)
        .await?;
    let result = match recipe {
        Some(recipe) => attach_details(&mut tx, vec![recipe]).await?.pop(),
        None => None,
    };
    tx.commit().await?;
    Ok(result)
}

pub async fn get_short_recipe_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<ShortRecipe, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, ShortRecipe>(
        "SELECT id, author_id, name, image, cooking_time FROM recipes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    result.ok_or(RequestError::NotFound("Recipe not found"))
}

/// Loads tags and ingredients for all given recipes with one query each.
async fn attach_details(
    conn: &mut SqliteConnection,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeResponse>, RequestError> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = recipes.iter().map(|recipe| recipe.id).collect();
    let ids = id_list(&ids);

    let tags = sqlx::query_as::<Sqlite, RecipeTag>(&format!(
        r#"
        SELECT recipe_tags.recipe_id AS recipe_id, tags.id AS id, tags.name AS name,
               tags.color AS color, tags.slug AS slug
        FROM recipe_tags
            JOIN tags ON tags.id = recipe_tags.tag_id
        WHERE recipe_tags.recipe_id IN {ids}
        ORDER BY tags.id
        "#
    ))
    .fetch_all(&mut *conn)
    .await?;

    let ingredients = sqlx::query_as::<Sqlite, RecipeIngredient>(&format!(
        r#"
        SELECT recipe_ingredients.recipe_id AS recipe_id, ingredients.id AS id,
               ingredients.name AS name, measurement_units.unit AS measurement_unit,
               recipe_ingredients.amount AS amount
        FROM recipe_ingredients
            JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
            JOIN measurement_units ON measurement_units.id = ingredients.measurement_unit_id
        WHERE recipe_ingredients.recipe_id IN {ids}
        ORDER BY recipe_ingredients.id
        "#
    ))
    .fetch_all(&mut *conn)
    .await?;

    let mut tags_by_recipe: HashMap<i64, Vec<TagResponse>> = HashMap::new();
    for tag in tags {
        tags_by_recipe
            .entry(tag.recipe_id)
            .or_default()
            .push(tag.into());
    }
    let mut ingredients_by_recipe: HashMap<i64, Vec<RecipeIngredientResponse>> = HashMap::new();
    for ingredient in ingredients {
        ingredients_by_recipe
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient.into());
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| {
            let tags = tags_by_recipe.remove(&recipe.id).unwrap_or_default();
            let ingredients = ingredients_by_recipe.remove(&recipe.id).unwrap_or_default();
            RecipeResponse::new(recipe, tags, ingredients)
        })
        .collect())
}

// ----------------- Mutations -----------------

fn name_taken(e: sqlx::Error) -> RequestError {
    if is_unique_violation(&e) {
        RequestError::Validation(FieldErrors::single(
            "name",
            "You already have a recipe with this name.",
        ))
    } else {
        RequestError::from(e)
    }
}

/// Creates the recipe row and its tag and ingredient rows in one transaction.
pub async fn create_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    draft: &RecipeDraft,
    image: &str,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let (recipe_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(image)
    .bind(draft.cooking_time)
    .fetch_one(&mut tx)
    .await
    .map_err(name_taken)?;

    replace_associations(&mut tx, recipe_id, &draft.tags, &draft.ingredients).await?;
    tx.commit().await?;
    tracing::info!(recipe_id, author_id, "recipe created");
    Ok(recipe_id)
}

/// Rewrites the recipe and replaces all of its associations. Returns the image
/// that was replaced, if a new one was supplied.
pub async fn update_recipe_in_db(
    pool: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
    draft: &RecipeDraft,
    image: Option<&str>,
) -> Result<Option<String>, RequestError> {
    let mut tx = pool.begin().await?;
    let previous_image = authorize_author(&mut tx, user_id, recipe_id).await?;

    sqlx::query(
        r#"
        UPDATE recipes
        SET name = ?, text = ?, cooking_time = ?, image = COALESCE(?, image),
            pub_date = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(image)
    .bind(recipe_id)
    .execute(&mut tx)
    .await
    .map_err(name_taken)?;

    replace_associations(&mut tx, recipe_id, &draft.tags, &draft.ingredients).await?;
    tx.commit().await?;
    tracing::info!(recipe_id, user_id, "recipe updated");
    Ok(image.map(|_| previous_image))
}

/// Deletes the recipe; join rows go with it. Returns the image to release.
pub async fn delete_recipe_in_db(
    pool: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
) -> Result<String, RequestError> {
    let mut tx = pool.begin().await?;
    let image = authorize_author(&mut tx, user_id, recipe_id).await?;
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::info!(recipe_id, user_id, "recipe deleted");
    Ok(image)
}

/// Fails unless the recipe exists and belongs to `user_id`. Returns its current image.
async fn authorize_author(
    conn: &mut SqliteConnection,
    user_id: i64,
    recipe_id: i64,
) -> Result<String, RequestError> {
    let recipe: Option<(i64, String)> =
        sqlx::query_as("SELECT author_id, image FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&mut *conn)
            .await?;
    match recipe {
        Some((author_id, image)) if author_id == user_id => Ok(image),
        Some(_) => Err(RequestError::Forbidden),
        None => Err(RequestError::NotFound("Recipe not found")),
    }
}

pub(crate) async fn recipe_exists(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<bool, RequestError> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

async fn existing_ids(
    conn: &mut SqliteConnection,
    table: &str,
    ids: &[i64],
) -> Result<HashSet<i64>, RequestError> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows: Vec<(i64,)> = sqlx::query_as(&format!(
        "SELECT id FROM {table} WHERE id IN {}",
        id_list(ids)
    ))
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Clears the recipe's tag and ingredient rows and inserts the given ones.
async fn replace_associations(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    tags: &[i64],
    ingredients: &[IngredientAmount],
) -> Result<(), RequestError> {
    let ingredient_ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
    let known_tags = existing_ids(conn, "tags", tags).await?;
    let known_ingredients = existing_ids(conn, "ingredients", &ingredient_ids).await?;

    let mut errors = FieldErrors::new();
    for id in tags.iter().filter(|id| !known_tags.contains(id)) {
        errors.add("tags", format!("Tag {id} does not exist."));
    }
    for id in ingredient_ids.iter().filter(|id| !known_ingredients.contains(id)) {
        errors.add("ingredients", format!("Ingredient {id} does not exist."));
    }
    errors.into_result()?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !tags.is_empty() {
        let values = vec!["(?, ?)"; tags.len()].join(", ");
        let query = format!("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES {values}");
        let mut insert = sqlx::query(&query);
        for tag in tags {
            insert = insert.bind(recipe_id).bind(*tag);
        }
        insert.execute(&mut *conn).await.map_err(association_error)?;
    }

    if !ingredients.is_empty() {
        let values = vec!["(?, ?, ?)"; ingredients.len()].join(", ");
        let query = format!(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES {values}"
        );
        let mut insert = sqlx::query(&query);
        for IngredientAmount { id, amount } in ingredients {
            insert = insert.bind(recipe_id).bind(*id).bind(*amount);
        }
        insert.execute(&mut *conn).await.map_err(association_error)?;
    }
    Ok(())
}

fn association_error(e: sqlx::Error) -> RequestError {
    if is_unique_violation(&e) {
        RequestError::Conflict("An ingredient or tag is listed more than once")
    } else if is_foreign_key_violation(&e) {
        RequestError::Validation(FieldErrors::single(
            "ingredients",
            "Referenced tag or ingredient does not exist.",
        ))
    } else {
        RequestError::from(e)
    }
}
