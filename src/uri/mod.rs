//! # URI Module
//!
//! URI templates, path patterns and URI component decoding used by the
//! routing tree and the routing context.
//!
//! - [`UriTemplate`] parses `@Path`-style templates (`/items/{id}`,
//!   `/files/{path: .+}`) and ranks them by specificity.
//! - [`PathPattern`] anchors a template and appends a right-hand-path group,
//!   producing a [`MatchResult`] per successful match.
//! - [`decode_path`] / [`decode_query`] split a request URI into path segments
//!   with matrix parameters and into query parameters, raw or decoded.
//! - [`MultivaluedMap`] and the read-only snapshot types back every
//!   multi-valued accessor exposed to application code.

mod component;
mod multimap;
mod pattern;
mod template;

#[cfg(test)]
mod tests;

pub use component::{decode, decode_path, decode_query, ComponentType, PathSegment};
pub use multimap::{ImmutableMultivaluedMap, MultivaluedMap, ReadOnlyList, UnsupportedOperation};
pub use pattern::{is_end_of_path, MatchResult, PathPattern, RightHandPath, MAX_INLINE_GROUPS};
pub use template::{TemplateError, UriTemplate, TEMPLATE_VALUE_PATTERN};
