//! Error types for the property API client.
//!
//! # Design
//! Only failures that prevent a response from reaching the caller are errors.
//! A non-2xx response with a JSON body is returned as data, and an invalid
//! page/limit pair is reported through `Listing::Rejected`, so neither shows
//! up here. Underlying errors are carried unchanged as sources.

use thiserror::Error;

/// Errors returned by `PropertyClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a readable response (connection, TLS, IO).
    #[error("transport failure: {0}")]
    Transport(#[from] ureq::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The response body was not the JSON the operation expected.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// Writing listed titles to the output stream failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// A required configuration value was not provided.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}
