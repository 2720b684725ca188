use sqlx::{query::QueryAs, sqlite::SqliteArguments, Sqlite};

mod annotations;
mod catalog_helpers;
mod recipe_helpers;
mod relation_helpers;
mod shopping_list_helpers;
mod subscription_helpers;
mod user_helpers;

pub use annotations::*;
pub use catalog_helpers::*;
pub use recipe_helpers::*;
pub use relation_helpers::*;
pub use shopping_list_helpers::*;
pub use subscription_helpers::*;
pub use user_helpers::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

/// Joins optional SQL fragments with a separator and keeps their bind parameters in order.
struct QueryBuilder {
    query: String,
    params: Vec<SqlParam>,
    seperator: &'static str,
    counter: usize,
}

impl QueryBuilder {
    fn new(initial: &str, seperator: &'static str) -> Self {
        Self {
            query: initial.to_owned(),
            params: vec![],
            seperator,
            counter: 0,
        }
    }

    fn add_param(mut self, filter: &str, params: impl IntoIterator<Item = SqlParam>) -> Self {
        if self.counter > 0 {
            self.query.push_str(self.seperator);
        }
        self.query.push_str(filter);
        self.params.extend(params);
        self.counter += 1;
        self
    }

    fn add_if(
        self,
        condition: bool,
        filter: &str,
        params: impl IntoIterator<Item = SqlParam>,
    ) -> Self {
        if condition {
            self.add_param(filter, params)
        } else {
            self
        }
    }

    /// Returns an empty query when no fragment was added.
    fn build(self) -> (String, Vec<SqlParam>) {
        if self.counter > 0 {
            (self.query, self.params)
        } else {
            (String::new(), self.params)
        }
    }
}

fn bind_params<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    params: Vec<SqlParam>,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Int(value) => query.bind(value),
            SqlParam::Text(value) => query.bind(value),
        };
    }
    query
}

/// Renders ids as an SQL `IN` list. Only integers ever reach the query text.
fn id_list(ids: &[i64]) -> String {
    let mut list = String::with_capacity(ids.len() * 4 + 2);
    list.push('(');
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            list.push(',');
        }
        list.push_str(&id.to_string());
    }
    list.push(')');
    list
}

fn placeholders(count: usize) -> String {
    let mut list = String::from("(");
    list.push_str(&vec!["?"; count].join(", "));
    list.push(')');
    list
}
