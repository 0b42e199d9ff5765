//! List queries and the paginated response envelope.
//!
//! Most list endpoints answer `{data, meta: {pagination: {...}}}`, a few answer
//! flat `{data, page, totalPages, totalCount}`, and some legacy ones return a
//! bare array. [`ListEnvelope`] models all three and [`ListEnvelope::into_page`]
//! folds them into one [`Page`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default rows per page for resource lists.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Everything that drives a list fetch. Any change to it means a refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub sort: Option<Sort>,
    /// Resource-specific filters, sent verbatim as query parameters
    pub filters: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            sort: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Query string pairs in the backend's naming.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search".to_string(), search.trim().to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sortBy".to_string(), sort.field.clone()));
            params.push(("sortDir".to_string(), sort.direction.to_string()));
        }
        for (key, value) in &self.filters {
            if !value.is_empty() {
                params.push((key.clone(), value.clone()));
            }
        }
        params
    }
}

/// Derived pagination state shown under a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// One page of rows plus its pagination state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub info: PageInfo,
}

/// `meta.pagination` block of the nested shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationFields {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_previous: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationMeta {
    pub pagination: PaginationFields,
}

/// Where the pagination metadata sits in the response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaginationShape {
    Nested { meta: PaginationMeta },
    Flat(PaginationFields),
}

impl PaginationShape {
    fn fields(self) -> PaginationFields {
        match self {
            PaginationShape::Nested { meta } => meta.pagination,
            PaginationShape::Flat(fields) => fields,
        }
    }
}

/// Every list response shape the backend is known to produce.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Paged {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
        #[serde(flatten)]
        pagination: PaginationShape,
    },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    /// Fold any envelope into a [`Page`]. Missing numbers fall back to zero,
    /// except the current page which falls back to the one requested.
    pub fn into_page(self, requested: &ListQuery) -> Page<T> {
        match self {
            ListEnvelope::Paged { data, pagination } => {
                let fields = pagination.fields();
                let page_size = fields.page_size.unwrap_or(requested.page_size);
                let total_count = fields.total_count.unwrap_or(0);
                let total_pages = fields.total_pages.unwrap_or_else(|| {
                    if page_size == 0 {
                        0
                    } else {
                        total_count.div_ceil(page_size as u64) as u32
                    }
                });
                let current_page = fields.page.unwrap_or(requested.page);
                Page {
                    rows: data,
                    info: PageInfo {
                        current_page,
                        page_size,
                        total_count,
                        total_pages,
                        has_next: fields.has_next.unwrap_or(current_page < total_pages),
                        has_previous: fields.has_previous.unwrap_or(current_page > 1),
                    },
                }
            }
            ListEnvelope::Bare(rows) => {
                let total_count = rows.len() as u64;
                Page {
                    info: PageInfo {
                        current_page: 1,
                        page_size: rows.len() as u32,
                        total_count,
                        total_pages: u32::from(total_count > 0),
                        has_next: false,
                        has_previous: false,
                    },
                    rows,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Row {
        id: i64,
    }

    fn parse(v: serde_json::Value) -> Page<Row> {
        let envelope: ListEnvelope<Row> = serde_json::from_value(v).unwrap();
        envelope.into_page(&ListQuery::default())
    }

    #[test]
    fn nested_and_flat_shapes_agree() {
        let nested = parse(json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"pagination": {"page": 2, "pageSize": 2, "totalCount": 7, "totalPages": 4,
                                     "hasNext": true, "hasPrevious": true}}
        }));
        let flat = parse(json!({
            "data": [{"id": 1}, {"id": 2}],
            "page": 2, "totalPages": 4, "totalCount": 7
        }));
        assert_eq!(nested.rows, flat.rows);
        assert_eq!(nested.info.current_page, flat.info.current_page);
        assert_eq!(nested.info.total_pages, flat.info.total_pages);
        assert_eq!(nested.info.total_count, flat.info.total_count);
        assert_eq!(flat.info.current_page, 2);
        assert_eq!(flat.info.total_pages, 4);
        assert_eq!(flat.info.total_count, 7);
        assert!(flat.info.has_next);
        assert!(flat.info.has_previous);
    }

    #[test]
    fn missing_metadata_falls_back_to_zero() {
        let page = parse(json!({"data": [{"id": 5}]}));
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.info.total_count, 0);
        assert_eq!(page.info.total_pages, 0);
        assert_eq!(page.info.current_page, 1);
        assert!(!page.info.has_next);

        let meta_without_pagination = parse(json!({"data": [], "meta": {}}));
        assert_eq!(meta_without_pagination.info.total_pages, 0);
    }

    #[test]
    fn total_pages_derived_from_count() {
        let page = parse(json!({"data": [], "totalCount": 21, "pageSize": 10}));
        assert_eq!(page.info.total_pages, 3);
    }

    #[test]
    fn bare_array_is_single_page() {
        let page = parse(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        assert_eq!(page.info.total_count, 3);
        assert_eq!(page.info.total_pages, 1);
        assert_eq!(page.info.current_page, 1);
    }

    #[test]
    fn params_skip_blank_values() {
        let mut query = ListQuery::with_page_size(25);
        query.search = Some("  ".to_string());
        query.sort = Some(Sort {
            field: "name".to_string(),
            direction: SortDirection::Desc,
        });
        query.filters.insert("companyId".to_string(), "3".to_string());
        query.filters.insert("status".to_string(), String::new());
        let params = query.to_params();
        assert!(params.contains(&("pageSize".to_string(), "25".to_string())));
        assert!(params.contains(&("sortDir".to_string(), "desc".to_string())));
        assert!(params.contains(&("companyId".to_string(), "3".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "search" || k == "status"));
    }
}
