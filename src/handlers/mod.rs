use axum::http::{StatusCode, Uri};

mod catalog;
mod recipes;
mod users;

pub use catalog::*;
pub use recipes::*;
pub use users::*;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    )
}
