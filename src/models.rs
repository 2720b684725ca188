use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub created_at: NaiveDateTime,
}

/// A user as seen by a viewer, with the viewer's subscription flag attached.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// A followed author together with the number of recipes they published.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeasurementUnit {
    pub id: i64,
    pub unit: String,
    /// Whether amounts in this unit can be summed, as opposed to units like "to taste".
    pub counted: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// A recipe row joined with its author and the viewer-dependent flags.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i64,
    pub pub_date: NaiveDateTime,
    pub author_id: i64,
    pub author_email: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeTag {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShortRecipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

/// One aggregated row of a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShoppingListEntry {
    pub ingredient_id: i64,
    pub name: String,
    pub unit: String,
    pub counted: bool,
    pub total: i64,
}
