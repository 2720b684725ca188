use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::{is_unique_violation, FieldErrors, RequestError},
    models::{Ingredient, MeasurementUnit, Tag},
    slugify,
};

const INGREDIENT_QUERY: &str = r#"
    SELECT ingredients.id AS id,
           ingredients.name AS name,
           measurement_units.unit AS measurement_unit
    FROM ingredients
        JOIN measurement_units ON measurement_units.id = ingredients.measurement_unit_id
"#;

// ----------------- Tags -----------------

pub async fn list_tags_in_db(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let mut tx = pool.begin().await?;
    let result =
        sqlx::query_as::<Sqlite, Tag>("SELECT id, name, color, slug FROM tags ORDER BY name")
            .fetch_all(&mut tx)
            .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_tag_in_db(pool: &SqlitePool, id: i64) -> Result<Tag, RequestError> {
    let mut tx = pool.begin().await?;
    let result =
        sqlx::query_as::<Sqlite, Tag>("SELECT id, name, color, slug FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut tx)
            .await?;
    tx.commit().await?;
    result.ok_or(RequestError::NotFound("Tag not found"))
}

/// Creates a tag; the slug is derived from the name when not given.
pub async fn create_tag_in_db(
    pool: &SqlitePool,
    name: &str,
    color: &str,
    slug: Option<&str>,
) -> Result<Tag, RequestError> {
    let slug = match slug {
        Some(slug) => slug.to_owned(),
        None => slugify(name),
    };
    if slug.is_empty() {
        return Err(RequestError::Validation(FieldErrors::single(
            "slug",
            "Use only latin letters, digits, hyphens and underscores.",
        )));
    }

    let mut tx = pool.begin().await?;
    let tag = sqlx::query_as::<Sqlite, Tag>(
        "INSERT INTO tags (name, color, slug) VALUES (?, ?, ?) RETURNING id, name, color, slug",
    )
    .bind(name)
    .bind(color)
    .bind(&slug)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RequestError::Validation(FieldErrors::single(
                "slug",
                "Tag with this slug already exists.",
            ))
        } else {
            RequestError::from(e)
        }
    })?;
    tx.commit().await?;
    Ok(tag)
}

// ----------------- Ingredients -----------------

pub async fn create_measurement_unit_in_db(
    pool: &SqlitePool,
    unit: &str,
    counted: bool,
) -> Result<MeasurementUnit, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, MeasurementUnit>(
        "INSERT INTO measurement_units (unit, counted) VALUES (?, ?) RETURNING id, unit, counted",
    )
    .bind(unit)
    .bind(counted)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RequestError::Conflict("Measurement unit already exists")
        } else {
            RequestError::from(e)
        }
    })?;
    tx.commit().await?;
    Ok(result)
}

pub async fn create_ingredient_in_db(
    pool: &SqlitePool,
    name: &str,
    measurement_unit_id: i64,
) -> Result<Ingredient, RequestError> {
    let mut tx = pool.begin().await?;
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit_id) VALUES (?, ?) RETURNING id",
    )
    .bind(name)
    .bind(measurement_unit_id)
    .fetch_one(&mut tx)
    .await?;
    let ingredient = sqlx::query_as::<Sqlite, Ingredient>(&format!(
        "{INGREDIENT_QUERY} WHERE ingredients.id = ?"
    ))
    .bind(id)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(ingredient)
}

pub async fn get_ingredient_in_db(pool: &SqlitePool, id: i64) -> Result<Ingredient, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Ingredient>(&format!(
        "{INGREDIENT_QUERY} WHERE ingredients.id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    result.ok_or(RequestError::NotFound("Ingredient not found"))
}

/// Case-insensitive name search: prefix matches first, then other substring matches.
pub async fn search_ingredients_in_db(
    pool: &SqlitePool,
    name: Option<&str>,
) -> Result<Vec<Ingredient>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            let pattern = escape_like(name);
            sqlx::query_as::<Sqlite, Ingredient>(&format!(
                r#"{INGREDIENT_QUERY}
                WHERE ingredients.name LIKE '%' || ? || '%' ESCAPE '\'
                ORDER BY ingredients.name LIKE ? || '%' ESCAPE '\' DESC,
                         ingredients.name, ingredients.id"#
            ))
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&mut tx)
            .await?
        }
        None => {
            sqlx::query_as::<Sqlite, Ingredient>(&format!(
                "{INGREDIENT_QUERY} ORDER BY ingredients.name, ingredients.id"
            ))
            .fetch_all(&mut tx)
            .await?
        }
    };
    tx.commit().await?;
    Ok(result)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
