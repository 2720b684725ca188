pub mod authentication;
pub mod config;
pub mod data_formats;
pub mod db_helpers;
pub mod errors;
mod handlers;
pub mod images;
pub mod models;
pub mod pagination;
pub mod recipe_service;
pub mod shopping_list;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
use handlers::*;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::{str::FromStr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use config::Config;
use images::ImageStore;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(config: Config) -> Result<()> {
    let pool = init_db(&config.database_url).await?;
    let images = ImageStore::new(&config.media_root);
    let app = build_app(pool, images);
    info!("Server started on {}", config.address);
    axum::Server::bind(&config.address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {db_url}"))?;
    } else {
        info!("Database already exists");
    }
    let options = SqliteConnectOptions::from_str(db_url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// A private in-memory database, kept on a single long-lived connection.
pub async fn init_memory_db() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    info!("Running Migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(())
}

/// The API router with its database pool and image store attached.
pub fn build_app(pool: SqlitePool, images: ImageStore) -> Router {
    let media = ServeDir::new(images.root());
    make_router()
        .nest_service("/media", media)
        .layer(Extension(Arc::new(images)))
        .layer(Extension(Arc::new(pool)))
        .layer(TraceLayer::new_for_http())
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/api/auth/token/login/", post(login_user))
        .route("/api/auth/token/logout/", post(logout_user))
        .route("/api/users/", get(list_users).post(register_user))
        .route("/api/users/me/", get(get_current_user))
        .route("/api/users/set_password/", post(set_password))
        .route("/api/users/subscriptions/", get(list_subscriptions))
        .route("/api/users/:id/", get(get_user))
        .route("/api/users/:id/subscribe/", post(subscribe).delete(unsubscribe))
        .route("/api/tags/", get(list_tags))
        .route("/api/tags/:id/", get(get_tag))
        .route("/api/ingredients/", get(list_ingredients))
        .route("/api/ingredients/:id/", get(get_ingredient))
        .route("/api/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/api/recipes/:id/",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/api/recipes/:id/favorite/",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/api/recipes/:id/shopping_cart/",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
        .fallback(not_found)
}

/// Lowercases ASCII letters and digits and joins the remaining words with hyphens.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("Breakfast"), "breakfast");
        assert_eq!(slugify("  Quick   lunch -- ideas "), "quick-lunch-ideas");
        assert_eq!(slugify("snake_case!"), "snake_case");
        assert_eq!(slugify("Завтрак"), "");
    }
}
