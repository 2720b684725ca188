#![allow(dead_code)]

use std::{
    net::TcpListener,
    path::{Path, PathBuf},
};

use sogustika::{
    build_app,
    data_formats::{IngredientAmount, RecipeRequest, RegisterRequest},
    db_helpers::{
        create_ingredient_in_db, create_measurement_unit_in_db, create_tag_in_db, insert_user,
    },
    images::ImageStore,
    init_memory_db,
    models::{Ingredient, Tag, User},
};
use sqlx::SqlitePool;

pub const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

pub struct Catalog {
    pub flour: Ingredient,
    pub salt: Ingredient,
    pub sugar: Ingredient,
    pub breakfast: Tag,
    pub lunch: Tag,
}

pub fn media_root() -> PathBuf {
    std::env::temp_dir().join(format!("sogustika-test-{}", uuid::Uuid::new_v4()))
}

pub async fn setup_db() -> SqlitePool {
    std::env::set_var("JWT_SECRET", "integration-test-secret");
    init_memory_db().await.unwrap()
}

/// Flour and sugar are measured in grams; salt is added to taste and is never summed.
pub async fn seed_catalog(pool: &SqlitePool) -> Catalog {
    let grams = create_measurement_unit_in_db(pool, "g", true).await.unwrap();
    let to_taste = create_measurement_unit_in_db(pool, "to taste", false)
        .await
        .unwrap();
    Catalog {
        flour: create_ingredient_in_db(pool, "flour", grams.id).await.unwrap(),
        salt: create_ingredient_in_db(pool, "salt", to_taste.id).await.unwrap(),
        sugar: create_ingredient_in_db(pool, "sugar", grams.id).await.unwrap(),
        breakfast: create_tag_in_db(pool, "Breakfast", "#E26C2D", None)
            .await
            .unwrap(),
        lunch: create_tag_in_db(pool, "Lunch", "#49B64E", None).await.unwrap(),
    }
}

/// Inserts a user directly; the stored password is not a real hash.
pub async fn seed_user(pool: &SqlitePool, username: &str) -> User {
    let request = RegisterRequest {
        email: format!("{username}@example.com"),
        username: username.to_owned(),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
        password: "not-a-hash".to_owned(),
    };
    insert_user(pool, &request).await.unwrap()
}

pub async fn count_favorites(pool: &SqlitePool, user_id: i64) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

/// Files currently stored in the recipe image directory.
pub fn stored_images(root: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(root.join("recipes/images")) {
        Ok(entries) => entries.map(|entry| entry.unwrap().path()).collect(),
        Err(_) => vec![],
    }
}

/// Location on disk of an image given by its public `/media/...` url.
pub fn image_path(root: &Path, url: &str) -> PathBuf {
    root.join(url.trim_start_matches("/media/"))
}

pub fn recipe_request(name: &str, tags: Vec<i64>, ingredients: &[(i64, i64)]) -> RecipeRequest {
    RecipeRequest {
        name: name.to_owned(),
        text: "Mix everything and bake.".to_owned(),
        cooking_time: 30,
        image: Some(PIXEL.to_owned()),
        tags,
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
    }
}

/// Serves the app on a random local port and returns its base url.
pub async fn spawn_app(pool: SqlitePool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let address = listener.local_addr().unwrap();
    let app = build_app(pool, ImageStore::new(media_root()));
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    format!("http://{address}")
}
