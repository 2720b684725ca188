//! Viewer-dependent columns computed as correlated subqueries.
//!
//! Every flag is an `EXISTS` probe against an edge table keyed by the row being
//! selected, so the cost grows with the page being rendered rather than with the
//! size of the relation tables. Anonymous viewers get constant `0` columns and no
//! probe is issued at all.

use super::SqlParam;

const RECIPE_FLAGS: &str = r#",
    EXISTS (SELECT 1 FROM favorites
            WHERE favorites.recipe_id = recipes.id
              AND favorites.user_id = ?) AS is_favorited,
    EXISTS (SELECT 1 FROM shopping_cart
            WHERE shopping_cart.recipe_id = recipes.id
              AND shopping_cart.user_id = ?) AS is_in_shopping_cart,
    EXISTS (SELECT 1 FROM subscriptions
            WHERE subscriptions.author_id = recipes.author_id
              AND subscriptions.subscriber_id = ?) AS is_subscribed"#;

const ANONYMOUS_RECIPE_FLAGS: &str =
    ", 0 AS is_favorited, 0 AS is_in_shopping_cart, 0 AS is_subscribed";

const USER_FLAGS: &str = r#",
    EXISTS (SELECT 1 FROM subscriptions
            WHERE subscriptions.author_id = users.id
              AND subscriptions.subscriber_id = ?) AS is_subscribed"#;

const ANONYMOUS_USER_FLAGS: &str = ", 0 AS is_subscribed";

/// Number of recipes authored by the selected user.
pub const RECIPES_COUNT: &str =
    ", (SELECT COUNT(*) FROM recipes WHERE recipes.author_id = users.id) AS recipes_count";

/// `is_favorited`, `is_in_shopping_cart` and `is_subscribed` for rows of `recipes`.
pub fn recipe_flags(viewer: Option<i64>) -> (&'static str, Vec<SqlParam>) {
    match viewer {
        Some(id) => (RECIPE_FLAGS, vec![SqlParam::Int(id); 3]),
        None => (ANONYMOUS_RECIPE_FLAGS, vec![]),
    }
}

/// `is_subscribed` for rows of `users`.
pub fn user_flags(viewer: Option<i64>) -> (&'static str, Vec<SqlParam>) {
    match viewer {
        Some(id) => (USER_FLAGS, vec![SqlParam::Int(id)]),
        None => (ANONYMOUS_USER_FLAGS, vec![]),
    }
}
