use sqlx::SqlitePool;

use crate::errors::{is_unique_violation, RequestError};

use super::{recipe_exists, user_exists};

/// A per-user edge that is either present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::ShoppingCart => "shopping_cart",
            Relation::Subscription => "subscriptions",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "user_id",
            Relation::Subscription => "subscriber_id",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "recipe_id",
            Relation::Subscription => "author_id",
        }
    }

    fn conflict_message(self) -> &'static str {
        match self {
            Relation::Favorite => "Recipe is already in favorites",
            Relation::ShoppingCart => "Recipe is already in the shopping cart",
            Relation::Subscription => "You are already subscribed to this author",
        }
    }
}

async fn ensure_target(
    conn: &mut sqlx::SqliteConnection,
    relation: Relation,
    target_id: i64,
) -> Result<(), RequestError> {
    let (exists, message) = match relation {
        Relation::Favorite | Relation::ShoppingCart => {
            (recipe_exists(conn, target_id).await?, "Recipe not found")
        }
        Relation::Subscription => (user_exists(conn, target_id).await?, "User not found"),
    };
    if exists {
        Ok(())
    } else {
        Err(RequestError::NotFound(message))
    }
}

/// Adds the edge. A second add of the same edge is rejected by the UNIQUE constraint.
pub async fn add_relation_in_db(
    pool: &SqlitePool,
    relation: Relation,
    owner_id: i64,
    target_id: i64,
) -> Result<(), RequestError> {
    if relation == Relation::Subscription && owner_id == target_id {
        return Err(RequestError::BadRequest("You cannot subscribe to yourself"));
    }
    let mut tx = pool.begin().await?;
    ensure_target(&mut tx, relation, target_id).await?;

    let query = format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?)",
        relation.table(),
        relation.owner_column(),
        relation.target_column()
    );
    sqlx::query(&query)
        .bind(owner_id)
        .bind(target_id)
        .execute(&mut tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RequestError::Conflict(relation.conflict_message())
            } else {
                RequestError::from(e)
            }
        })?;
    tx.commit().await?;
    tracing::debug!(?relation, owner_id, target_id, "relation added");
    Ok(())
}

/// Removes the edge. Removing an absent edge is not an error; returns whether a row was deleted.
pub async fn remove_relation_in_db(
    pool: &SqlitePool,
    relation: Relation,
    owner_id: i64,
    target_id: i64,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    ensure_target(&mut tx, relation, target_id).await?;

    let query = format!(
        "DELETE FROM {} WHERE {} = ? AND {} = ?",
        relation.table(),
        relation.owner_column(),
        relation.target_column()
    );
    let result = sqlx::query(&query)
        .bind(owner_id)
        .bind(target_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::debug!(
        ?relation,
        owner_id,
        target_id,
        removed = result.rows_affected(),
        "relation removed"
    );
    Ok(result.rows_affected() > 0)
}
