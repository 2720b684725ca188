mod request;
mod response;

pub use request::*;
pub use response::*;

use crate::errors::{FieldErrors, RequestError};

/// Filters accepted by the recipe listing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, RequestError> {
        let mut filter = Self::default();
        let mut errors = FieldErrors::new();
        for (key, value) in pairs {
            match key.as_str() {
                "tags" if !value.is_empty() => filter.tags.push(value.clone()),
                "author" if !value.is_empty() => match value.parse::<i64>() {
                    Ok(author) => filter.author = Some(author),
                    Err(_) => errors.add("author", "Enter a number."),
                },
                "is_favorited" => match parse_flag(value) {
                    Some(flag) => filter.is_favorited = flag,
                    None => errors.add("is_favorited", "Enter a valid boolean."),
                },
                "is_in_shopping_cart" => match parse_flag(value) {
                    Some(flag) => filter.is_in_shopping_cart = flag,
                    None => errors.add("is_in_shopping_cart", "Enter a valid boolean."),
                },
                _ => {}
            }
        }
        errors.into_result()?;
        Ok(filter)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" | "" => Some(false),
        _ => None,
    }
}

/// `recipes_limit` of the subscriptions listing; `None` keeps every recipe.
pub fn recipes_limit_from_pairs(pairs: &[(String, String)]) -> Option<usize> {
    pairs
        .iter()
        .find(|(key, _)| key == "recipes_limit")
        .and_then(|(_, value)| value.parse().ok())
}
