//! Recipe writes that span the database and the image store.
//!
//! The database part of every write runs in one transaction (see
//! `db_helpers::create_recipe_in_db` and friends). Images are written before the
//! transaction starts and removed again if it fails; an image that was replaced
//! or whose recipe was deleted is released only after the commit.

use sqlx::SqlitePool;

use crate::{
    data_formats::{RecipeRequest, RecipeResponse},
    db_helpers::{create_recipe_in_db, delete_recipe_in_db, get_recipe_in_db, update_recipe_in_db},
    errors::RequestError,
    images::{DecodedImage, ImageStore},
};

async fn store_image(images: &ImageStore, image: &DecodedImage) -> Result<String, RequestError> {
    images.save(image).await.map_err(|e| {
        tracing::error!(error = %e, "failed to store recipe image");
        RequestError::ServerError
    })
}

pub async fn create_recipe(
    pool: &SqlitePool,
    images: &ImageStore,
    author_id: i64,
    request: RecipeRequest,
) -> Result<RecipeResponse, RequestError> {
    let draft = request.validate(true)?;
    let image = draft.image.as_ref().ok_or(RequestError::ServerError)?;
    let image = store_image(images, image).await?;

    let recipe_id = match create_recipe_in_db(pool, author_id, &draft, &image).await {
        Ok(id) => id,
        Err(e) => {
            images.release(&image).await;
            return Err(e);
        }
    };

    get_recipe_in_db(pool, Some(author_id), recipe_id)
        .await?
        .ok_or(RequestError::NotFound("Recipe not found"))
}

pub async fn update_recipe(
    pool: &SqlitePool,
    images: &ImageStore,
    user_id: i64,
    recipe_id: i64,
    request: RecipeRequest,
) -> Result<RecipeResponse, RequestError> {
    let draft = request.validate(false)?;
    let image = match &draft.image {
        Some(image) => Some(store_image(images, image).await?),
        None => None,
    };

    match update_recipe_in_db(pool, user_id, recipe_id, &draft, image.as_deref()).await {
        Ok(Some(previous)) => images.release(&previous).await,
        Ok(None) => {}
        Err(e) => {
            if let Some(image) = &image {
                images.release(image).await;
            }
            return Err(e);
        }
    }

    get_recipe_in_db(pool, Some(user_id), recipe_id)
        .await?
        .ok_or(RequestError::NotFound("Recipe not found"))
}

pub async fn delete_recipe(
    pool: &SqlitePool,
    images: &ImageStore,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), RequestError> {
    let image = delete_recipe_in_db(pool, user_id, recipe_id).await?;
    images.release(&image).await;
    Ok(())
}
