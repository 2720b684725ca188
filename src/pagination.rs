use axum::http::Uri;
use serde::Serialize;

use crate::errors::RequestError;

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

const INVALID_PAGE: RequestError = RequestError::NotFound("Invalid page.");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// Reads `page` and `limit` from query pairs. An unparsable `limit` falls back to the default.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, RequestError> {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    params.page = match value.parse::<i64>() {
                        Ok(page) if page >= 1 => page,
                        _ => return Err(INVALID_PAGE),
                    }
                }
                "limit" => {
                    if let Ok(limit) = value.parse::<i64>() {
                        if limit >= 1 {
                            params.limit = limit.min(MAX_PAGE_SIZE);
                        }
                    }
                }
                _ => {}
            }
        }
        // The offset must fit in an i64 for the page to be addressable at all.
        if (params.page - 1).checked_mul(params.limit).is_none() {
            return Err(INVALID_PAGE);
        }
        Ok(params)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wraps one page of results. Any page after the first must start inside `count`.
    pub fn new(
        results: Vec<T>,
        count: i64,
        params: PageParams,
        uri: &Uri,
    ) -> Result<Self, RequestError> {
        if params.page > 1 && params.offset() >= count {
            return Err(INVALID_PAGE);
        }
        let next = (params.page.saturating_mul(params.limit) < count)
            .then(|| page_link(uri, params.page + 1));
        let previous = (params.page > 1).then(|| page_link(uri, params.page - 1));
        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

fn page_link(uri: &Uri, page: i64) -> String {
    let mut query: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .collect();
    let page = format!("page={page}");
    query.push(&page);
    format!("{}?{}", uri.path(), query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_page_and_limit() {
        let params = PageParams::from_pairs(&pairs(&[("page", "3"), ("limit", "10")])).unwrap();
        assert_eq!(params, PageParams { page: 3, limit: 10 });
        assert_eq!(params.offset(), 20);

        let params = PageParams::from_pairs(&pairs(&[("limit", "1000")])).unwrap();
        assert_eq!(params.limit, MAX_PAGE_SIZE);

        let params = PageParams::from_pairs(&pairs(&[("limit", "abc")])).unwrap();
        assert_eq!(params.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn invalid_page_is_not_found() {
        assert!(PageParams::from_pairs(&pairs(&[("page", "0")])).is_err());
        assert!(PageParams::from_pairs(&pairs(&[("page", "x")])).is_err());
        assert!(matches!(
            PageParams::from_pairs(&pairs(&[("page", "9223372036854775807")])),
            Err(RequestError::NotFound(_))
        ));

        let params = PageParams::from_pairs(&pairs(&[("page", "1537228672809129301")])).unwrap();
        assert_eq!(params.offset(), 1537228672809129300 * 6);
    }

    #[test]
    fn huge_pages_do_not_overflow() {
        let uri: Uri = "/api/recipes/".parse().unwrap();
        let params = PageParams {
            page: i64::MAX / 2,
            limit: 6,
        };
        assert!(Page::new(Vec::<i64>::new(), 3, params, &uri).is_err());
        assert_eq!(params.offset(), i64::MAX);
    }

    #[test]
    fn page_past_the_end_is_not_found() {
        let uri: Uri = "/api/recipes/".parse().unwrap();
        let params = PageParams { page: 3, limit: 2 };
        assert!(matches!(
            Page::new(Vec::<i64>::new(), 4, params, &uri),
            Err(RequestError::NotFound(_))
        ));

        let empty = Page::new(Vec::<i64>::new(), 0, PageParams::default(), &uri).unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.next.is_none() && empty.previous.is_none());
    }

    #[test]
    fn links_keep_other_filters() {
        let uri: Uri = "/api/recipes/?tags=lunch&page=2&limit=2".parse().unwrap();
        let page = Page::new(vec![1, 2], 7, PageParams { page: 2, limit: 2 }, &uri).unwrap();
        assert_eq!(
            page.next.as_deref(),
            Some("/api/recipes/?tags=lunch&limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/api/recipes/?tags=lunch&limit=2&page=1")
        );

        let last = Page::new(vec![7], 7, PageParams { page: 4, limit: 2 }, &uri).unwrap();
        assert!(last.next.is_none());
    }
}
