use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    data_formats::{IngredientResponse, TagResponse},
    db_helpers::{get_ingredient_in_db, get_tag_in_db, list_tags_in_db, search_ingredients_in_db},
    errors::RequestError,
};

type JsonResult<T> = Result<Json<T>, RequestError>;

#[derive(Deserialize, Debug, Default)]
pub struct IngredientSearch {
    #[serde(default)]
    name: Option<String>,
}

pub async fn list_tags(
    Extension(pool): Extension<Arc<SqlitePool>>,
) -> JsonResult<Vec<TagResponse>> {
    let tags = list_tags_in_db(&pool).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

pub async fn get_tag(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(id): Path<i64>,
) -> JsonResult<TagResponse> {
    Ok(Json(get_tag_in_db(&pool, id).await?.into()))
}

pub async fn list_ingredients(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(IngredientSearch { name }): Query<IngredientSearch>,
) -> JsonResult<Vec<IngredientResponse>> {
    let ingredients = search_ingredients_in_db(&pool, name.as_deref()).await?;
    Ok(Json(
        ingredients
            .into_iter()
            .map(IngredientResponse::from)
            .collect(),
    ))
}

pub async fn get_ingredient(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(id): Path<i64>,
) -> JsonResult<IngredientResponse> {
    Ok(Json(get_ingredient_in_db(&pool, id).await?.into()))
}
