//! Query parameter construction for upstream requests.

use crate::entity::{join_ids, EntityId};
use crate::error::FetchError;

/// Largest page the upstream API serves.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Query parameter carrying the access credential.
pub const CREDENTIAL_PARAM: &str = "access_token";

/// Which entities a request selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdSelector {
    /// No `ids` parameter: collection endpoints answer with the ID list
    #[default]
    None,
    /// `ids=all`
    All,
    /// `ids=1,2,3`
    Ids(Vec<EntityId>),
}

/// Per-call request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub ids: IdSelector,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl RequestParams {
    pub fn ids(ids: &[EntityId]) -> Self {
        Self {
            ids: IdSelector::Ids(ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            ids: IdSelector::All,
            ..Self::default()
        }
    }

    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}

/// Parameters attached to every request made by one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub lang: String,
    pub access_token: Option<String>,
    pub schema_version: Option<String>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            access_token: None,
            schema_version: None,
        }
    }
}

/// Builds the query string pairs, rejecting requests that cannot succeed.
pub fn build_query(
    defaults: &QueryDefaults,
    params: &RequestParams,
) -> Result<Vec<(&'static str, String)>, FetchError> {
    let mut query = vec![("lang", defaults.lang.clone())];

    if let Some(token) = &defaults.access_token {
        query.push((CREDENTIAL_PARAM, token.clone()));
    }
    if let Some(version) = &defaults.schema_version {
        query.push(("v", version.clone()));
    }

    match &params.ids {
        IdSelector::None => {}
        IdSelector::All => query.push(("ids", "all".to_string())),
        IdSelector::Ids(ids) if ids.is_empty() => {
            return Err(FetchError::InvalidRequest(
                "explicit ID list is empty".to_string(),
            ))
        }
        IdSelector::Ids(ids) => query.push(("ids", join_ids(ids))),
    }

    if let Some(page) = params.page {
        query.push(("page", page.to_string()));
    }
    if let Some(size) = params.page_size {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(FetchError::InvalidRequest(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
            )));
        }
        query.push(("page_size", size.to_string()));
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_minimal_query_has_only_lang() {
        let query = build_query(&QueryDefaults::default(), &RequestParams::default()).unwrap();
        assert_eq!(query, vec![("lang", "en".to_string())]);
    }

    #[test]
    fn test_full_query() {
        let defaults = QueryDefaults {
            lang: "de".to_string(),
            access_token: Some("secret".to_string()),
            schema_version: Some("2019-05-22T00:00:00Z".to_string()),
        };
        let params = RequestParams {
            ids: IdSelector::Ids(vec![EntityId::Int(1), EntityId::Int(2)]),
            page: Some(3),
            page_size: Some(50),
        };

        let query = build_query(&defaults, &params).unwrap();

        assert_eq!(value(&query, "lang"), Some("de"));
        assert_eq!(value(&query, CREDENTIAL_PARAM), Some("secret"));
        assert_eq!(value(&query, "v"), Some("2019-05-22T00:00:00Z"));
        assert_eq!(value(&query, "ids"), Some("1,2"));
        assert_eq!(value(&query, "page"), Some("3"));
        assert_eq!(value(&query, "page_size"), Some("50"));
    }

    #[test]
    fn test_all_selector() {
        let query = build_query(&QueryDefaults::default(), &RequestParams::all()).unwrap();
        assert_eq!(value(&query, "ids"), Some("all"));
    }

    #[test]
    fn test_empty_id_list_is_rejected() {
        let result = build_query(&QueryDefaults::default(), &RequestParams::ids(&[]));
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn test_page_size_bounds() {
        let defaults = QueryDefaults::default();
        assert!(build_query(&defaults, &RequestParams::page(0, 0)).is_err());
        assert!(build_query(&defaults, &RequestParams::page(0, MAX_PAGE_SIZE + 1)).is_err());
        assert!(build_query(&defaults, &RequestParams::page(0, MAX_PAGE_SIZE)).is_ok());
    }
}
