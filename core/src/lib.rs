//! Synchronous client for a real-estate listing API's `/properties` endpoints.
//!
//! # Overview
//! `PropertyClient` lists, creates, retrieves and updates properties, and
//! builds the `Location` and `QueryOptions` values those calls take. Every
//! call is one blocking round trip and returns the server's JSON verbatim.
//!
//! # Design
//! - The client is configured once and shared read-only; it owns its session
//!   (headers plus a reused `ureq::Agent`).
//! - Each operation has a `build_*` method producing a plain `HttpRequest`,
//!   executed through the `Transport` trait, so request construction is
//!   testable without I/O.
//! - Client-side rules are limited to page/limit validation, clamping the
//!   limit at 50, and merging caller options over required body fields.
//! - Properties stay opaque `serde_json::Value`s; only the pagination
//!   envelope is typed.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::{parse_response, PageWindow, PropertyClient, MAX_LIMIT};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{
    BadRequest, BodyOptions, ListParams, Listing, Location, Pagination, PropertyPage,
    PropertySummary, QueryOptions,
};
