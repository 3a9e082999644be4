use http::{Method, StatusCode};
use thiserror::Error;

use crate::model::ModelError;

/// Routing and negotiation outcomes that do not end in a dispatch.
///
/// Every variant maps to a distinct HTTP status via [`RoutingError::status`].
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No resource path matches.
    #[error("no resource matches path '{path}'")]
    NotFound { path: String },
    /// The path matched but no resource method handles the verb.
    #[error("method {method} is not allowed, allowed methods: {allow:?}")]
    MethodNotAllowed { method: Method, allow: Vec<Method> },
    /// No produced type is acceptable to the client.
    #[error("no representation acceptable for Accept '{accept}'")]
    NotAcceptable { accept: String },
    /// No resource method consumes the request entity type.
    #[error("unsupported request media type '{content_type}'")]
    UnsupportedMediaType { content_type: String },
    /// Malformed `Accept` or `Content-Type` header.
    #[error("bad request: {reason}")]
    BadRequest { reason: String },
    /// A sub-resource locator failed.
    #[error("sub-resource locator '{locator}' failed: {error:#}")]
    Locator { locator: String, error: anyhow::Error },
    /// The sub-resource returned by a locator could not be compiled.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RoutingError {
    pub fn status(&self) -> StatusCode {
        match self {
            RoutingError::NotFound { .. } => StatusCode::NOT_FOUND,
            RoutingError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RoutingError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            RoutingError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RoutingError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RoutingError::Locator { .. } | RoutingError::Model(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The `Allow` set of a 405.
    pub fn allow(&self) -> Option<&[Method]> {
        match self {
            RoutingError::MethodNotAllowed { allow, .. } => Some(allow),
            _ => None,
        }
    }
}
