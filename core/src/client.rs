//! Blocking client for the properties API.
//!
//! # Design
//! `PropertyClient` is configured once (base URL, headers, transport) and
//! never mutated afterwards. Each operation is split into a `build_*` method
//! that produces an `HttpRequest` and a call through the `Transport`. The
//! build step holds all the client-side rules: page/limit normalization and
//! the merge of caller options into request bodies.
//!
//! Responses are parsed as JSON and returned verbatim whatever the status
//! code, so a remote error body reaches the caller unchanged.

use std::io::{self, Write};

use serde_json::{Map, Value};
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    set_pair, BadRequest, BodyOptions, ListParams, Listing, Location, PropertyPage, QueryOptions,
};

/// Largest page size the API serves.
pub const MAX_LIMIT: u64 = 50;

/// Page size requested by the title loop.
const TITLE_PAGE_SIZE: u64 = 50;

/// Page and limit as they are sent, after validation and truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    /// The requested limit exceeded `MAX_LIMIT` and was lowered to it.
    pub clamped: bool,
}

impl PageWindow {
    /// Rejects page or limit below 1 (NaN included), caps limit at
    /// `MAX_LIMIT`, then truncates both toward zero.
    pub fn normalize(page: f64, limit: f64) -> Result<Self, BadRequest> {
        if page.is_nan() || limit.is_nan() || page < 1.0 || limit < 1.0 {
            return Err(BadRequest::default());
        }
        let clamped = limit > MAX_LIMIT as f64;
        let limit = if clamped { MAX_LIMIT } else { limit.trunc() as u64 };
        Ok(Self {
            page: page.trunc() as u64,
            limit,
            clamped,
        })
    }
}

/// Client for the `/properties` endpoints.
///
/// Every request carries `accept` and `content-type` set to JSON plus the
/// API key in `x-authorization`.
#[derive(Debug, Clone)]
pub struct PropertyClient<T = UreqTransport> {
    base_url: String,
    headers: Vec<(String, String)>,
    transport: T,
}

impl PropertyClient<UreqTransport> {
    /// Client for the default base URL.
    pub fn new(api_key: &str) -> Self {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> PropertyClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
            ("x-authorization".to_string(), config.api_key),
        ];
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_list_properties(&self, window: &PageWindow, options: &QueryOptions) -> HttpRequest {
        let mut query = vec![
            ("page".to_string(), window.page.to_string()),
            ("limit".to_string(), window.limit.to_string()),
        ];
        for (key, value) in options.iter() {
            set_pair(&mut query, key, value);
        }
        self.request(HttpMethod::Get, format!("{}/properties", self.base_url), query, None)
    }

    pub fn build_create_property(
        &self,
        property_type: &str,
        title: &str,
        description: &str,
        status: &str,
        location: &Location,
        options: &BodyOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut body = required_fields(property_type, title, description, status);
        let location = serde_json::to_value(location).map_err(ApiError::SerializationError)?;
        body.insert("location".to_string(), location);
        let body = encode_body(body, options)?;
        Ok(self.request(
            HttpMethod::Post,
            format!("{}/properties", self.base_url),
            Vec::new(),
            Some(body),
        ))
    }

    pub fn build_retrieve_property(&self, property_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("{}/properties/{property_id}", self.base_url),
            Vec::new(),
            None,
        )
    }

    pub fn build_update_property(
        &self,
        property_id: &str,
        property_type: &str,
        title: &str,
        description: &str,
        status: &str,
        options: &BodyOptions,
    ) -> Result<HttpRequest, ApiError> {
        let body = required_fields(property_type, title, description, status);
        let body = encode_body(body, options)?;
        Ok(self.request(
            HttpMethod::Patch,
            format!("{}/properties/{property_id}", self.base_url),
            Vec::new(),
            Some(body),
        ))
    }

    /// Lists one page of properties.
    ///
    /// Page or limit below 1 yields `Listing::Rejected` without touching the
    /// network. A limit above 50 is lowered to 50 with a warning.
    pub fn list_properties(&self, params: &ListParams) -> Result<Listing, ApiError> {
        let window = match PageWindow::normalize(params.page, params.limit) {
            Ok(window) => window,
            Err(bad) => return Ok(Listing::Rejected(bad)),
        };
        if window.clamped {
            warn!(
                requested = params.limit,
                "limit must be less than or equal to {MAX_LIMIT}, it has been set to {MAX_LIMIT}"
            );
        }
        let request = self.build_list_properties(&window, &params.options);
        let response = self.transport.execute(request)?;
        parse_response(response).map(Listing::Page)
    }

    /// Creates a property. Keys in `options` override the named fields.
    pub fn create_property(
        &self,
        property_type: &str,
        title: &str,
        description: &str,
        status: &str,
        location: &Location,
        options: &BodyOptions,
    ) -> Result<Value, ApiError> {
        let request = self.build_create_property(
            property_type,
            title,
            description,
            status,
            location,
            options,
        )?;
        parse_response(self.transport.execute(request)?)
    }

    /// Fetches one property by public or internal ID.
    pub fn retrieve_property(&self, property_id: &str) -> Result<Value, ApiError> {
        let request = self.build_retrieve_property(property_id);
        parse_response(self.transport.execute(request)?)
    }

    /// Updates a property. Keys in `options` override the named fields.
    pub fn update_property(
        &self,
        property_id: &str,
        property_type: &str,
        title: &str,
        description: &str,
        status: &str,
        options: &BodyOptions,
    ) -> Result<Value, ApiError> {
        let request = self.build_update_property(
            property_id,
            property_type,
            title,
            description,
            status,
            options,
        )?;
        parse_response(self.transport.execute(request)?)
    }

    /// Writes the title of every listed property, one per line, and returns
    /// how many were written.
    ///
    /// Pages are requested 50 at a time. The running count advances by the
    /// limit the server reports, and the loop ends once it reaches the total
    /// reported by the latest page. Both values are re-read on every page, so
    /// a total that changes mid-walk changes where the walk stops.
    pub fn write_all_property_titles<W: Write>(&self, out: &mut W) -> Result<usize, ApiError> {
        let mut page = 1;
        let mut count = 0;
        let mut written = 0;
        loop {
            let window = PageWindow {
                page,
                limit: TITLE_PAGE_SIZE,
                clamped: false,
            };
            let request = self.build_list_properties(&window, &QueryOptions::default());
            let response = self.transport.execute(request)?;
            let listed: PropertyPage =
                serde_json::from_str(&response.body).map_err(ApiError::DeserializationError)?;

            for property in &listed.content {
                writeln!(out, "{}", property.title)?;
                written += 1;
            }

            count += listed.pagination.limit;
            if listed.pagination.limit == 0 || count >= listed.pagination.total {
                break;
            }
            page += 1;
        }
        Ok(written)
    }

    /// `write_all_property_titles` to stdout.
    pub fn print_all_property_titles(&self) -> Result<(), ApiError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_all_property_titles(&mut out)?;
        out.flush()?;
        Ok(())
    }

    fn request(
        &self,
        method: HttpMethod,
        url: String,
        query: Vec<(String, String)>,
        body: Option<String>,
    ) -> HttpRequest {
        HttpRequest {
            method,
            url,
            query,
            headers: self.headers.clone(),
            body,
        }
    }
}

/// Parse a response body as JSON without looking at the status code.
pub fn parse_response(response: HttpResponse) -> Result<Value, ApiError> {
    serde_json::from_str(&response.body).map_err(ApiError::DeserializationError)
}

fn required_fields(
    property_type: &str,
    title: &str,
    description: &str,
    status: &str,
) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("property_type".to_string(), Value::from(property_type));
    body.insert("title".to_string(), Value::from(title));
    body.insert("description".to_string(), Value::from(description));
    body.insert("status".to_string(), Value::from(status));
    body
}

/// Options are applied after the required fields, so they win on conflict.
fn encode_body(mut body: Map<String, Value>, options: &BodyOptions) -> Result<String, ApiError> {
    for (key, value) in options {
        body.insert(key.clone(), value.clone());
    }
    serde_json::to_string(&Value::Object(body)).map_err(ApiError::SerializationError)
}
