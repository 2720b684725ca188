use std::collections::HashMap;

use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{
    data_formats::{ShortRecipeResponse, SubscriptionResponse},
    errors::RequestError,
    models::{ShortRecipe, Subscription},
    pagination::PageParams,
};

use super::{bind_params, id_list, user_flags, SqlParam, RECIPES_COUNT};

const SUBSCRIPTION_COLUMNS: &str = r#"
    users.id AS id, users.email AS email, users.username AS username,
    users.first_name AS first_name, users.last_name AS last_name"#;

/// Authors followed by `subscriber_id`, each with up to `recipes_limit` newest recipes.
pub async fn list_subscriptions_in_db(
    pool: &SqlitePool,
    subscriber_id: i64,
    page: PageParams,
    recipes_limit: Option<usize>,
) -> Result<(Vec<SubscriptionResponse>, i64), RequestError> {
    let mut tx = pool.begin().await?;
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?")
            .bind(subscriber_id)
            .fetch_one(&mut tx)
            .await?;

    let (flags, mut params) = user_flags(Some(subscriber_id));
    params.push(SqlParam::Int(subscriber_id));
    params.push(SqlParam::Int(page.limit));
    params.push(SqlParam::Int(page.offset()));
    let query = format!(
        r#"
        SELECT {SUBSCRIPTION_COLUMNS}{flags}{RECIPES_COUNT}
        FROM subscriptions
            JOIN users ON users.id = subscriptions.author_id
        WHERE subscriptions.subscriber_id = ?
        ORDER BY users.username, users.id
        LIMIT ? OFFSET ?
        "#
    );
    let authors = bind_params(sqlx::query_as::<Sqlite, Subscription>(&query), params)
        .fetch_all(&mut tx)
        .await?;
    let result = attach_recipes(&mut tx, authors, recipes_limit).await?;
    tx.commit().await?;
    Ok((result, count))
}

/// One author as shown in the subscriptions listing, from `viewer`'s perspective.
pub async fn get_subscription_in_db(
    pool: &SqlitePool,
    viewer: i64,
    author_id: i64,
    recipes_limit: Option<usize>,
) -> Result<SubscriptionResponse, RequestError> {
    let mut tx = pool.begin().await?;
    let (flags, mut params) = user_flags(Some(viewer));
    params.push(SqlParam::Int(author_id));
    let query = format!(
        "SELECT {SUBSCRIPTION_COLUMNS}{flags}{RECIPES_COUNT} FROM users WHERE users.id = ?"
    );
    let author = bind_params(sqlx::query_as::<Sqlite, Subscription>(&query), params)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let result = attach_recipes(&mut tx, vec![author], recipes_limit).await?;
    tx.commit().await?;
    result
        .into_iter()
        .next()
        .ok_or(RequestError::NotFound("User not found"))
}

async fn attach_recipes(
    conn: &mut SqliteConnection,
    authors: Vec<Subscription>,
    recipes_limit: Option<usize>,
) -> Result<Vec<SubscriptionResponse>, RequestError> {
    if authors.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i64> = authors.iter().map(|author| author.id).collect();
    let recipes = sqlx::query_as::<Sqlite, ShortRecipe>(&format!(
        r#"
        SELECT id, author_id, name, image, cooking_time
        FROM recipes
        WHERE author_id IN {}
        ORDER BY pub_date DESC, id DESC
        "#,
        id_list(&ids)
    ))
    .fetch_all(&mut *conn)
    .await?;

    let mut by_author: HashMap<i64, Vec<ShortRecipeResponse>> = HashMap::new();
    for recipe in recipes {
        let list = by_author.entry(recipe.author_id).or_default();
        if recipes_limit.map_or(true, |limit| list.len() < limit) {
            list.push(recipe.into());
        }
    }

    Ok(authors
        .into_iter()
        .map(|author| {
            let recipes = by_author.remove(&author.id).unwrap_or_default();
            SubscriptionResponse::new(author, recipes)
        })
        .collect())
}
