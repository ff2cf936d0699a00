//! Request payloads and response envelopes for the properties API.
//!
//! Properties themselves stay opaque (`serde_json::Value`); only the pieces
//! the client has to build or read are typed here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UPDATED_AFTER: &str = "search[updated_after]";
pub const UPDATED_BEFORE: &str = "search[updated_before]";

pub const BAD_REQUEST_ERROR: &str = "Bad request";
pub const BAD_REQUEST_MESSAGE: &str =
    "page and limit params must be an integer greater than or equal to 1";

/// Extra fields merged into a create/update body. Keys here replace the
/// required fields of the same name.
pub type BodyOptions = Map<String, Value>;

/// Address of a property, embedded as `location` in a create request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Neighborhood, city and state; must match a location known to the API.
    pub name: String,
    pub street: String,
    pub exterior_number: String,
    pub interior_number: String,
    pub cross_street: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        street: &str,
        exterior_number: &str,
        interior_number: &str,
        cross_street: &str,
        postal_code: &str,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            street: street.to_string(),
            exterior_number: exterior_number.to_string(),
            interior_number: interior_number.to_string(),
            cross_street: cross_street.to_string(),
            postal_code: postal_code.to_string(),
            latitude,
            longitude,
        }
    }
}

/// Filters appended to the list request's query string, sent in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    entries: Vec<(String, String)>,
}

impl QueryOptions {
    /// Update-date filters; each key is present only when its date is given.
    /// Dates are passed through as-is (`YYYY-MM-DD`).
    pub fn new(updated_after: Option<&str>, updated_before: Option<&str>) -> Self {
        let mut options = Self::default();
        if let Some(date) = updated_after {
            options = options.with(UPDATED_AFTER, date);
        }
        if let Some(date) = updated_before {
            options = options.with(UPDATED_BEFORE, date);
        }
        options
    }

    /// Sets `key` to `value`, replacing an earlier value for the same key.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        set_pair(&mut self.entries, key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Last write wins: an existing key keeps its position but takes the new value.
pub(crate) fn set_pair(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some(pair) => pair.1 = value.to_string(),
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

/// Arguments of a list call. `page` and `limit` accept fractional input and
/// are truncated toward zero before sending.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: f64,
    pub limit: f64,
    pub options: QueryOptions,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1.0,
            limit: 20.0,
            options: QueryOptions::default(),
        }
    }
}

impl ListParams {
    pub fn new(page: f64, limit: f64) -> Self {
        Self {
            page,
            limit,
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

/// The locally produced rejection for an invalid page/limit pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadRequest {
    pub error: String,
    pub message: String,
}

impl Default for BadRequest {
    fn default() -> Self {
        Self {
            error: BAD_REQUEST_ERROR.to_string(),
            message: BAD_REQUEST_MESSAGE.to_string(),
        }
    }
}

/// Outcome of a list call that got past transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// The server's response body, verbatim.
    Page(Value),
    /// Page or limit was below 1; nothing was sent.
    Rejected(BadRequest),
}

impl Listing {
    pub fn page(&self) -> Option<&Value> {
        match self {
            Listing::Page(value) => Some(value),
            Listing::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Listing::Rejected(_))
    }

    /// Renders either variant as the JSON object a caller would branch on.
    pub fn into_value(self) -> Value {
        match self {
            Listing::Page(value) => value,
            Listing::Rejected(bad) => serde_json::json!({
                "error": bad.error,
                "message": bad.message,
            }),
        }
    }
}

/// Server-reported position within a paged result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// The slice of a listed property the title loop reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertySummary {
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub title: String,
}

/// Typed view of a list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyPage {
    pub pagination: Pagination,
    #[serde(default)]
    pub content: Vec<PropertySummary>,
}
