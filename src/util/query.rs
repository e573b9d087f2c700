//! Normalization of list-endpoint query strings into a pagination, sort and
//! filter descriptor. Every input resolves to a usable descriptor.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest, web};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl RawListQuery {
    /// Collects the recognized keys from a raw query string. Repeated keys keep
    /// their first value and unknown keys are ignored, so no query string is
    /// ever rejected here.
    pub fn from_query_string(query: &str) -> Self {
        let pairs = web::Query::<Vec<(String, String)>>::from_query(query)
            .map(web::Query::into_inner)
            .unwrap_or_default();

        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut raw.page,
                "limit" => &mut raw.limit,
                "search" => &mut raw.search,
                "sortBy" => &mut raw.sort_by,
                "sortOrder" => &mut raw.sort_order,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        raw
    }
}

impl FromRequest for RawListQuery {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_query_string(req.query_string())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub search_field: String,
    pub default_sort_by: String,
    pub default_sort_order: SortOrder,
    pub default_limit: u32,
    pub default_page: u32,
    pub max_limit: Option<u32>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            search_field: "nama".to_string(),
            default_sort_by: "id".to_string(),
            default_sort_order: SortOrder::Asc,
            default_limit: 10,
            default_page: 1,
            max_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
    pub skip: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub sort_by: String,
    pub sort_order: SortOrder,
}

/// Case-insensitive substring match on a single field. `None` matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchFilter(Option<ContainsFilter>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainsFilter {
    pub field: String,
    pub term: String,
}

impl SearchFilter {
    pub fn contains(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self(Some(ContainsFilter {
            field: field.into(),
            term: term.into(),
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn condition(&self) -> Option<&ContainsFilter> {
        self.0.as_ref()
    }

    pub fn matches(&self, value: &str) -> bool {
        match &self.0 {
            None => true,
            Some(filter) => value.to_lowercase().contains(&filter.term.to_lowercase()),
        }
    }

    /// `ILIKE` pattern with LIKE metacharacters in the term escaped.
    pub fn ilike_pattern(&self) -> Option<String> {
        self.0.as_ref().map(|filter| {
            let mut escaped = String::with_capacity(filter.term.len() + 2);
            for ch in filter.term.chars() {
                if matches!(ch, '%' | '_' | '\\') {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
            format!("%{escaped}%")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub pagination: PageWindow,
    pub sort: SortSpec,
    #[serde(rename = "where")]
    pub filter: SearchFilter,
}

impl ListQuery {
    pub fn parse(raw: &RawListQuery, options: &QueryOptions) -> Self {
        let default_page = options.default_page.max(1);
        let default_limit = options.default_limit.max(1);

        let page = raw
            .page
            .as_deref()
            .and_then(parse_positive)
            .unwrap_or(default_page);
        let mut limit = raw
            .limit
            .as_deref()
            .and_then(parse_positive)
            .unwrap_or(default_limit);
        if let Some(max) = options.max_limit {
            limit = limit.min(max.max(1));
        }

        let filter = match raw.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                SearchFilter::contains(options.search_field.clone(), term)
            }
            _ => SearchFilter::default(),
        };

        let sort_by = raw
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| options.default_sort_by.clone());
        let sort_order = raw
            .sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or(options.default_sort_order);

        Self {
            pagination: PageWindow {
                page,
                limit,
                skip: (u64::from(page) - 1) * u64::from(limit),
            },
            sort: SortSpec {
                sort_by,
                sort_order,
            },
            filter,
        }
    }
}

/// Reads the leading integer of `raw` the way lenient query parsers do
/// (`"2abc"` is 2) and keeps it only when positive.
fn parse_positive(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return None;
    }
    digits[..end].parse::<u32>().ok().filter(|value| *value > 0)
}
