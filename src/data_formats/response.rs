use serde::{Deserialize, Serialize};

use crate::{
    images::image_url,
    models::{
        Ingredient, Profile, Recipe, RecipeIngredient, RecipeTag, ShortRecipe, Subscription, Tag,
        User,
    },
};

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Returned right after registration, before any viewer-specific flag exists.
#[derive(Deserialize, Serialize, Debug)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortRecipeResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SubscriptionResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: i64,
}

impl From<User> for CreatedUserResponse {
    fn from(
        User {
            email,
            id,
            username,
            first_name,
            last_name,
            ..
        }: User,
    ) -> Self {
        CreatedUserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
        }
    }
}

impl From<Profile> for UserResponse {
    fn from(
        Profile {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed,
        }: Profile,
    ) -> Self {
        UserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
            is_subscribed,
        }
    }
}

impl From<Tag> for TagResponse {
    fn from(Tag { id, name, color, slug }: Tag) -> Self {
        TagResponse {
            id,
            name,
            color,
            slug,
        }
    }
}

impl From<RecipeTag> for TagResponse {
    fn from(
        RecipeTag {
            id,
            name,
            color,
            slug,
            ..
        }: RecipeTag,
    ) -> Self {
        TagResponse {
            id,
            name,
            color,
            slug,
        }
    }
}

impl From<Ingredient> for IngredientResponse {
    fn from(
        Ingredient {
            id,
            name,
            measurement_unit,
        }: Ingredient,
    ) -> Self {
        IngredientResponse {
            id,
            name,
            measurement_unit,
        }
    }
}

impl From<RecipeIngredient> for RecipeIngredientResponse {
    fn from(
        RecipeIngredient {
            id,
            name,
            measurement_unit,
            amount,
            ..
        }: RecipeIngredient,
    ) -> Self {
        RecipeIngredientResponse {
            id,
            name,
            measurement_unit,
            amount,
        }
    }
}

impl From<ShortRecipe> for ShortRecipeResponse {
    fn from(
        ShortRecipe {
            id,
            name,
            image,
            cooking_time,
            ..
        }: ShortRecipe,
    ) -> Self {
        ShortRecipeResponse {
            id,
            name,
            image: image_url(&image),
            cooking_time,
        }
    }
}

impl RecipeResponse {
    pub fn new(
        Recipe {
            id,
            name,
            text,
            image,
            cooking_time,
            author_id,
            author_email,
            author_username,
            author_first_name,
            author_last_name,
            is_favorited,
            is_in_shopping_cart,
            is_subscribed,
            ..
        }: Recipe,
        tags: Vec<TagResponse>,
        ingredients: Vec<RecipeIngredientResponse>,
    ) -> Self {
        RecipeResponse {
            id,
            tags,
            author: UserResponse {
                email: author_email,
                id: author_id,
                username: author_username,
                first_name: author_first_name,
                last_name: author_last_name,
                is_subscribed,
            },
            ingredients,
            is_favorited,
            is_in_shopping_cart,
            name,
            image: image_url(&image),
            text,
            cooking_time,
        }
    }
}

impl SubscriptionResponse {
    pub fn new(
        Subscription {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed,
            recipes_count,
        }: Subscription,
        recipes: Vec<ShortRecipeResponse>,
    ) -> Self {
        SubscriptionResponse {
            email,
            id,
            username,
            first_name,
            last_name,
            is_subscribed,
            recipes,
            recipes_count,
        }
    }
}
