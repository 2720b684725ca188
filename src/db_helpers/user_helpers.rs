use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{
    data_formats::RegisterRequest,
    errors::{is_unique_violation, FieldErrors, RequestError},
    models::{Profile, User},
    pagination::PageParams,
};

use super::{bind_params, user_flags, SqlParam};

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password, created_at";

const PROFILE_COLUMNS: &str = r#"
    users.id AS id, users.email AS email, users.username AS username,
    users.first_name AS first_name, users.last_name AS last_name"#;

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

/// Inserts a user whose password is already hashed.
pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<Sqlite, User>(&format!(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user.email.trim())
    .bind(&user.username)
    .bind(user.first_name.trim())
    .bind(user.last_name.trim())
    .bind(&user.password)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            let field = if e.to_string().contains("users.email") {
                "email"
            } else {
                "username"
            };
            RequestError::Validation(FieldErrors::single(
                field,
                format!("A user with that {field} already exists."),
            ))
        } else {
            RequestError::from(e)
        }
    })?;
    tx.commit().await?;
    Ok(user)
}

pub async fn update_password_in_db(
    pool: &SqlitePool,
    id: i64,
    hashed_password: &str,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    tx.commit().await?;
    Ok(())
}

pub(crate) async fn user_exists(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<bool, RequestError> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

pub async fn get_profile_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    id: i64,
) -> Result<Profile, RequestError> {
    let mut tx = pool.begin().await?;
    let (flags, mut params) = user_flags(viewer);
    params.push(SqlParam::Int(id));
    let query = format!("SELECT {PROFILE_COLUMNS}{flags} FROM users WHERE users.id = ?");
    let profile = bind_params(sqlx::query_as::<Sqlite, Profile>(&query), params)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    profile.ok_or(RequestError::NotFound("User not found"))
}

pub async fn list_profiles_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    page: PageParams,
) -> Result<(Vec<Profile>, i64), RequestError> {
    let mut tx = pool.begin().await?;
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&mut tx)
        .await?;

    let (flags, mut params) = user_flags(viewer);
    params.push(SqlParam::Int(page.limit));
    params.push(SqlParam::Int(page.offset()));
    let query = format!(
        "SELECT {PROFILE_COLUMNS}{flags} FROM users ORDER BY users.id LIMIT ? OFFSET ?"
    );
    let profiles = bind_params(sqlx::query_as::<Sqlite, Profile>(&query), params)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok((profiles, count))
}
