use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{JsonBody, RecipeFilter, RecipeRequest, RecipeResponse, ShortRecipeResponse},
    db_helpers::{
        add_relation_in_db, get_recipe_in_db, get_shopping_list_in_db, get_short_recipe_in_db,
        list_recipes_in_db, remove_relation_in_db, Relation,
    },
    errors::RequestError,
    images::ImageStore,
    pagination::{Page, PageParams},
    recipe_service,
    shopping_list::{render_text, shopping_list_lines, SHOPPING_LIST_FILENAME},
};

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Recipe Handlers -----------------
pub async fn list_recipes(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> JsonResult<Page<RecipeResponse>> {
    let filter = RecipeFilter::from_pairs(&pairs)?;
    let page = PageParams::from_pairs(&pairs)?;
    let (recipes, count) = list_recipes_in_db(&pool, maybe_user.get_id(), &filter, page).await?;
    Ok(Json(Page::new(recipes, count, page, &uri)?))
}

pub async fn get_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> JsonResult<RecipeResponse> {
    let recipe = get_recipe_in_db(&pool, maybe_user.get_id(), id)
        .await?
        .ok_or(RequestError::NotFound("Recipe not found"))?;
    Ok(Json(recipe))
}

pub async fn create_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(images): Extension<Arc<ImageStore>>,
    user: AuthUser,
    JsonBody(request): JsonBody<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), RequestError> {
    let recipe = recipe_service::create_recipe(&pool, &images, user.id, request).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(images): Extension<Arc<ImageStore>>,
    user: AuthUser,
    Path(id): Path<i64>,
    JsonBody(request): JsonBody<RecipeRequest>,
) -> JsonResult<RecipeResponse> {
    let recipe = recipe_service::update_recipe(&pool, &images, user.id, id, request).await?;
    Ok(Json(recipe))
}

pub async fn delete_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Extension(images): Extension<Arc<ImageStore>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    recipe_service::delete_recipe(&pool, &images, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Favorite / Cart Handlers -----------------
async fn add_recipe_relation(
    pool: &SqlitePool,
    relation: Relation,
    user: AuthUser,
    id: i64,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), RequestError> {
    add_relation_in_db(pool, relation, user.id, id).await?;
    let recipe = get_short_recipe_in_db(pool, id).await?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

pub async fn add_favorite(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), RequestError> {
    add_recipe_relation(&pool, Relation::Favorite, user, id).await
}

pub async fn remove_favorite(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    remove_relation_in_db(&pool, Relation::Favorite, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_shopping_cart(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), RequestError> {
    add_recipe_relation(&pool, Relation::ShoppingCart, user, id).await
}

pub async fn remove_from_shopping_cart(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    remove_relation_in_db(&pool, Relation::ShoppingCart, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
) -> Result<impl IntoResponse, RequestError> {
    let entries = get_shopping_list_in_db(&pool, user.id).await?;
    let document = render_text(&shopping_list_lines(entries));
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        document,
    ))
}
