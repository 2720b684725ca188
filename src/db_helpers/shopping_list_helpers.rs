use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::ShoppingListEntry};

const SHOPPING_LIST_QUERY: &str = r#"
    SELECT ingredients.id                  AS ingredient_id,
           ingredients.name                AS name,
           measurement_units.unit          AS unit,
           measurement_units.counted       AS counted,
           SUM(recipe_ingredients.amount)  AS total
    FROM shopping_cart
        JOIN recipes ON recipes.id = shopping_cart.recipe_id
        JOIN recipe_ingredients ON recipe_ingredients.recipe_id = recipes.id
        JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        JOIN measurement_units ON measurement_units.id = ingredients.measurement_unit_id
    WHERE shopping_cart.user_id = ?
    GROUP BY ingredients.id, ingredients.name, measurement_units.unit, measurement_units.counted
    ORDER BY ingredients.id
"#;

/// Sums ingredient amounts over every recipe in the user's cart, one row per ingredient.
pub async fn get_shopping_list_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ShoppingListEntry>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, ShoppingListEntry>(SHOPPING_LIST_QUERY)
        .bind(user_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}
