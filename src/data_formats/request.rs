use std::collections::HashSet;

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::Request,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{FieldErrors, RequestError},
    images::{decode_data_url, DecodedImage},
};

const REQUIRED: &str = "This field is required.";
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_USERNAME_LENGTH: usize = 150;
const MAX_NAME_LENGTH: usize = 150;
const MAX_RECIPE_NAME_LENGTH: usize = 200;

/// A JSON request body whose rejections use the field-keyed error format.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, B, T> FromRequest<S, B> for JsonBody<T>
where
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = RequestError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "rejected request body");
                Err(RequestError::Validation(FieldErrors::single(
                    "body",
                    rejection.body_text(),
                )))
            }
        }
    }
}

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut errors = FieldErrors::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !is_email(email) {
            errors.add("email", "Enter a valid email address.");
        } else if email.len() > MAX_EMAIL_LENGTH {
            errors.add("email", "Ensure this field has no more than 254 characters.");
        }

        if self.username.is_empty() {
            errors.add("username", REQUIRED);
        } else if !is_username(&self.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if self.username.chars().count() > MAX_USERNAME_LENGTH {
            errors.add("username", "Ensure this field has no more than 150 characters.");
        }

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                errors.add(field, REQUIRED);
            } else if value.chars().count() > MAX_NAME_LENGTH {
                errors.add(field, "Ensure this field has no more than 150 characters.");
            }
        }

        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }

        errors.into_result()
    }
}

impl SetPasswordRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut errors = FieldErrors::new();
        if self.current_password.is_empty() {
            errors.add("current_password", REQUIRED);
        }
        if self.new_password.is_empty() {
            errors.add("new_password", REQUIRED);
        }
        errors.into_result()
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_username(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
}

// ----------------- Recipe Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Body of both recipe creation and recipe update.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// A recipe payload that passed validation and is ready to be written.
#[derive(Debug)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: Option<DecodedImage>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeRequest {
    /// Checks every field and reports all problems at once.
    pub fn validate(self, require_image: bool) -> Result<RecipeDraft, RequestError> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        } else if name.chars().count() > MAX_RECIPE_NAME_LENGTH {
            errors.add("name", "Ensure this field has no more than 200 characters.");
        }

        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }

        if self.cooking_time < 1 {
            errors.add("cooking_time", "Ensure this value is greater than or equal to 1.");
        }

        if self.tags.is_empty() {
            errors.add("tags", "At least one tag is required.");
        }
        let mut seen_tags = HashSet::new();
        for tag in &self.tags {
            if !seen_tags.insert(*tag) {
                errors.add("tags", format!("Tag {tag} is listed more than once."));
            }
        }

        if self.ingredients.is_empty() {
            errors.add("ingredients", "At least one ingredient is required.");
        }
        let mut seen_ingredients = HashSet::new();
        for IngredientAmount { id, amount } in &self.ingredients {
            if !seen_ingredients.insert(*id) {
                errors.add("ingredients", format!("Ingredient {id} is listed more than once."));
            }
            if *amount < 1 {
                errors.add(
                    "ingredients",
                    format!("Amount of ingredient {id} must be at least 1."),
                );
            }
        }

        let image = match self.image.as_deref() {
            Some(data) => match decode_data_url(data) {
                Ok(image) => Some(image),
                Err(message) => {
                    errors.add("image", message);
                    None
                }
            },
            None => {
                if require_image {
                    errors.add("image", REQUIRED);
                }
                None
            }
        };

        errors.into_result()?;

        Ok(RecipeDraft {
            name,
            text: self.text,
            cooking_time: self.cooking_time,
            image,
            tags: self.tags,
            ingredients: self.ingredients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    fn valid_recipe() -> RecipeRequest {
        RecipeRequest {
            name: "Pancakes".to_owned(),
            text: "Mix and fry.".to_owned(),
            cooking_time: 20,
            image: Some(PIXEL.to_owned()),
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 1 },
            ],
        }
    }

    fn field_errors(result: Result<RecipeDraft, RequestError>) -> FieldErrors {
        match result {
            Err(RequestError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_recipe() {
        let draft = valid_recipe().validate(true).unwrap();
        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.image.unwrap().extension, "png");
        assert_eq!(draft.ingredients.len(), 2);
    }

    #[test]
    fn collects_every_violation() {
        let request = RecipeRequest {
            cooking_time: 0,
            tags: vec![],
            ingredients: vec![
                IngredientAmount { id: 4, amount: 10 },
                IngredientAmount { id: 4, amount: 0 },
            ],
            ..valid_recipe()
        };
        let errors = field_errors(request.validate(true));

        assert!(errors.get("cooking_time").is_some());
        assert!(errors.get("tags").is_some());
        assert_eq!(errors.get("ingredients").map(<[String]>::len), Some(2));
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn rejects_empty_ingredients_and_duplicate_tags() {
        let request = RecipeRequest {
            tags: vec![3, 3],
            ingredients: vec![],
            ..valid_recipe()
        };
        let errors = field_errors(request.validate(true));
        assert!(errors.get("tags").is_some());
        assert!(errors.get("ingredients").is_some());
    }

    #[test]
    fn image_is_required_only_on_create() {
        let request = RecipeRequest {
            image: None,
            ..valid_recipe()
        };
        let errors = field_errors(request.validate(true));
        assert_eq!(errors.get("image"), Some(&[REQUIRED.to_owned()][..]));

        let request = RecipeRequest {
            image: None,
            ..valid_recipe()
        };
        assert!(request.validate(false).unwrap().image.is_none());
    }

    #[test]
    fn malformed_image_is_a_field_error() {
        let request = RecipeRequest {
            image: Some("not an image".to_owned()),
            ..valid_recipe()
        };
        let errors = field_errors(request.validate(true));
        assert!(errors.get("image").is_some());
    }

    #[test]
    fn register_validation() {
        let request = RegisterRequest {
            email: "cook@example".to_owned(),
            username: "bad name".to_owned(),
            first_name: String::new(),
            last_name: "Smith".to_owned(),
            password: "secret".to_owned(),
        };
        let errors = match request.validate() {
            Err(RequestError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(errors.get("email").is_some());
        assert!(errors.get("username").is_some());
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("last_name").is_none());

        let request = RegisterRequest {
            email: "cook@example.com".to_owned(),
            username: "chef.anna+1".to_owned(),
            first_name: "Anna".to_owned(),
            last_name: "Smith".to_owned(),
            password: "secret".to_owned(),
        };
        assert!(request.validate().is_ok());
    }
}
