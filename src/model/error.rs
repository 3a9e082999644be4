use thiserror::Error;

use crate::errors::ErrorMessagesError;
use crate::media::MediaTypeParseError;
use crate::uri::TemplateError;

/// Failure to turn a resource model into a routing tree.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A `@Path` style template does not parse.
    #[error("invalid path template on resource '{resource}': {source}")]
    Template {
        resource: String,
        #[source]
        source: TemplateError,
    },
    /// A declared consumes/produces media type does not parse.
    #[error("invalid media type '{media_type}' on resource method '{method}': {source}")]
    MediaType {
        method: String,
        media_type: String,
        #[source]
        source: MediaTypeParseError,
    },
    /// Validation collected fatal issues and errors are not ignored.
    #[error("resource model validation failed: {0}")]
    Validation(#[from] ErrorMessagesError),
    /// A custom model builder failed.
    #[error("resource model builder failed: {0:#}")]
    Builder(anyhow::Error),
}
