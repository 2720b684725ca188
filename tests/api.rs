mod common;

use common::*;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

async fn register_and_login(client: &Client, base: &str, username: &str) -> (i64, String) {
    let response = client
        .post(format!("{base}/api/users/"))
        .json(&json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "first_name": "Test",
            "last_name": "User",
            "password": "correct horse battery staple",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.unwrap();
    assert!(user.get("password").is_none());
    let id = user["id"].as_i64().unwrap();

    let response = client
        .post(format!("{base}/api/auth/token/login/"))
        .json(&json!({
            "email": format!("{username}@example.com"),
            "password": "correct horse battery staple",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let token = body["auth_token"].as_str().unwrap().to_owned();
    (id, format!("Token {token}"))
}

#[tokio::test]
async fn health_check_and_unknown_routes() {
    let base = spawn_app(setup_db().await).await;
    let client = Client::new();

    let response = client.get(format!("{base}/check_health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(format!("{base}/api/nothing/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let pool = setup_db().await;
    let base = spawn_app(pool).await;
    let client = Client::new();

    let response = client
        .post(format!("{base}/api/users/"))
        .json(&json!({ "email": "not-an-email", "username": "bad name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert!(body["errors"][field].is_array(), "missing error for {field}");
    }

    register_and_login(&client, &base, "alice").await;
    let response = client
        .post(format!("{base}/api/users/"))
        .json(&json!({
            "email": "alice@example.com",
            "username": "alice2",
            "first_name": "A",
            "last_name": "B",
            "password": "pw",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let base = spawn_app(setup_db().await).await;
    let client = Client::new();
    register_and_login(&client, &base, "alice").await;

    let response = client
        .post(format!("{base}/api/auth/token/login/"))
        .json(&json!({ "email": "alice@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let base = spawn_app(setup_db().await).await;
    let client = Client::new();

    for path in [
        "/api/users/me/",
        "/api/users/",
        "/api/users/subscriptions/",
        "/api/recipes/download_shopping_cart/",
    ] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let response = client
        .get(format!("{base}/api/users/me/"))
        .header("Authorization", "Token garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client.get(format!("{base}/api/recipes/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn recipe_lifecycle_over_http() {
    let pool = setup_db().await;
    let catalog = seed_catalog(&pool).await;
    let base = spawn_app(pool).await;
    let client = Client::new();
    let (author_id, author) = register_and_login(&client, &base, "baker").await;
    let (_, stranger) = register_and_login(&client, &base, "stranger").await;

    let response = client
        .post(format!("{base}/api/recipes/"))
        .header("Authorization", &author)
        .json(&json!({
            "name": "Pancakes",
            "text": "Whisk and fry.",
            "cooking_time": 15,
            "image": PIXEL,
            "tags": [catalog.breakfast.id],
            "ingredients": [
                { "id": catalog.flour.id, "amount": 300 },
                { "id": catalog.salt.id, "amount": 1 },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let recipe: Value = response.json().await.unwrap();
    let recipe_id = recipe["id"].as_i64().unwrap();
    assert_eq!(recipe["author"]["id"].as_i64(), Some(author_id));
    assert_eq!(recipe["is_favorited"], json!(false));

    let image = recipe["image"].as_str().unwrap();
    let response = client.get(format!("{base}{image}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .patch(format!("{base}/api/recipes/{recipe_id}/"))
        .header("Authorization", &stranger)
        .json(&json!({
            "name": "Stolen",
            "text": "Mine now.",
            "cooking_time": 5,
            "tags": [catalog.lunch.id],
            "ingredients": [{ "id": catalog.flour.id, "amount": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let favorite = format!("{base}/api/recipes/{recipe_id}/favorite/");
    let response = client
        .post(&favorite)
        .header("Authorization", &stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = client
        .post(&favorite)
        .header("Authorization", &stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .get(format!("{base}/api/recipes/?is_favorited=1"))
        .header("Authorization", &stranger)
        .send()
        .await
        .unwrap();
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["count"], json!(1));
    assert_eq!(page["results"][0]["is_favorited"], json!(true));

    let response = client
        .post(format!("{base}/api/recipes/{recipe_id}/shopping_cart/"))
        .header("Authorization", &stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{base}/api/recipes/download_shopping_cart/"))
        .header("Authorization", &stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(disposition.contains("shopping-list.txt"));
    let text = response.text().await.unwrap();
    assert!(text.contains("flour 300 g"));

    let response = client
        .delete(format!("{base}/api/recipes/{recipe_id}/"))
        .header("Authorization", &author)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{base}/api/recipes/{recipe_id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscribing_over_http() {
    let base = spawn_app(setup_db().await).await;
    let client = Client::new();
    let (author_id, _) = register_and_login(&client, &base, "baker").await;
    let (reader_id, reader) = register_and_login(&client, &base, "reader").await;

    let subscribe = format!("{base}/api/users/{author_id}/subscribe/");
    let response = client
        .post(&subscribe)
        .header("Authorization", &reader)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_subscribed"], json!(true));
    assert_eq!(body["recipes_count"], json!(0));

    let response = client
        .post(&subscribe)
        .header("Authorization", &reader)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{base}/api/users/{reader_id}/subscribe/"))
        .header("Authorization", &reader)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{base}/api/users/subscriptions/"))
        .header("Authorization", &reader)
        .send()
        .await
        .unwrap();
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["count"], json!(1));

    for _ in 0..2 {
        let response = client
            .delete(&subscribe)
            .header("Authorization", &reader)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = client
        .get(format!("{base}/api/users/{author_id}/"))
        .header("Authorization", &reader)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_subscribed"], json!(false));
}

#[tokio::test]
async fn malformed_bodies_use_the_error_format() {
    let pool = setup_db().await;
    let catalog = seed_catalog(&pool).await;
    let base = spawn_app(pool).await;
    let client = Client::new();
    let (_, author) = register_and_login(&client, &base, "baker").await;

    let response = client
        .post(format!("{base}/api/recipes/"))
        .header("Authorization", &author)
        .json(&json!({
            "name": "Pancakes",
            "text": "Whisk and fry.",
            "cooking_time": "15",
            "image": PIXEL,
            "tags": [catalog.breakfast.id],
            "ingredients": [{ "id": catalog.flour.id, "amount": 300 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["errors"]["body"][0].is_string());

    let response = client
        .post(format!("{base}/api/auth/token/login/"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["errors"]["body"].is_array());
}

#[tokio::test]
async fn pages_outside_the_listing_are_not_found() {
    let base = spawn_app(setup_db().await).await;
    let client = Client::new();

    let response = client.get(format!("{base}/api/recipes/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["count"], json!(0));
    assert_eq!(page["next"], Value::Null);

    for page in ["2", "0", "9223372036854775807"] {
        let response = client
            .get(format!("{base}/api/recipes/?page={page}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "page {page}");
    }
}
