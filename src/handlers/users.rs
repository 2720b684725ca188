use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser, MaybeUser,
    },
    data_formats::{
        recipes_limit_from_pairs, CreatedUserResponse, JsonBody, LoginRequest, RegisterRequest,
        SetPasswordRequest, SubscriptionResponse, TokenResponse, UserResponse,
    },
    db_helpers::{
        add_relation_in_db, get_profile_in_db, get_subscription_in_db, get_user_by_email,
        get_user_by_id, insert_user, list_profiles_in_db, list_subscriptions_in_db,
        remove_relation_in_db, update_password_in_db, Relation,
    },
    errors::{FieldErrors, RequestError},
    pagination::{Page, PageParams},
};

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Auth Handlers -----------------
pub async fn login_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> JsonResult<TokenResponse> {
    const INVALID: RequestError =
        RequestError::NotAuthorized("Unable to log in with provided credentials");

    let user = get_user_by_email(&pool, request.email.trim())
        .await?
        .ok_or(INVALID)?;
    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification failed");
            RequestError::ServerError
        })?;
    if !is_password_correct {
        return Err(INVALID);
    }

    let auth_token = get_jwt_token(user.id).map_err(|e| {
        tracing::error!(error = %e, "could not issue token");
        RequestError::ServerError
    })?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { auth_token }))
}

/// Tokens are stateless; logging out only checks that the caller was logged in.
pub async fn logout_user(_user: AuthUser) -> StatusCode {
    StatusCode::NO_CONTENT
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    JsonBody(mut request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), RequestError> {
    request.validate()?;
    request.password = hash_password_argon2(request.password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "could not hash password");
            RequestError::ServerError
        })?;
    let user = insert_user(&pool, &request).await?;
    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn list_users(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> JsonResult<Page<UserResponse>> {
    let page = PageParams::from_pairs(&pairs)?;
    let (profiles, count) = list_profiles_in_db(&pool, Some(user.id), page).await?;
    let results = profiles.into_iter().map(UserResponse::from).collect();
    Ok(Json(Page::new(results, count, page, &uri)?))
}

pub async fn get_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> JsonResult<UserResponse> {
    let profile = get_profile_in_db(&pool, maybe_user.get_id(), id).await?;
    Ok(Json(profile.into()))
}

pub async fn get_current_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
) -> JsonResult<UserResponse> {
    let profile = get_profile_in_db(&pool, Some(user.id), user.id).await?;
    Ok(Json(profile.into()))
}

pub async fn set_password(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    JsonBody(request): JsonBody<SetPasswordRequest>,
) -> Result<StatusCode, RequestError> {
    request.validate()?;
    let current = get_user_by_id(&pool, user.id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let is_password_correct = verify_password_argon2(request.current_password, &current.password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    if !is_password_correct {
        return Err(RequestError::Validation(FieldErrors::single(
            "current_password",
            "Invalid password.",
        )));
    }
    let hashed = hash_password_argon2(request.new_password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    update_password_in_db(&pool, user.id, &hashed).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Subscription Handlers -----------------
pub async fn list_subscriptions(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> JsonResult<Page<SubscriptionResponse>> {
    let page = PageParams::from_pairs(&pairs)?;
    let recipes_limit = recipes_limit_from_pairs(&pairs);
    let (results, count) = list_subscriptions_in_db(&pool, user.id, page, recipes_limit).await?;
    Ok(Json(Page::new(results, count, page, &uri)?))
}

pub async fn subscribe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    Path(author_id): Path<i64>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), RequestError> {
    add_relation_in_db(&pool, Relation::Subscription, user.id, author_id).await?;
    let recipes_limit = recipes_limit_from_pairs(&pairs);
    let subscription = get_subscription_in_db(&pool, user.id, author_id, recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    user: AuthUser,
    Path(author_id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    remove_relation_in_db(&pool, Relation::Subscription, user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
