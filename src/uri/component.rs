//! URI component decoding: path segments, matrix parameters and queries.
//!
//! Every accessor comes in a raw (percent-encoded, exactly as received) and a
//! decoded variant. Decoding never fails: byte sequences that are not valid
//! UTF-8 after percent-decoding are replaced lossily.

use std::borrow::Cow;

use super::multimap::MultivaluedMap;

/// Which URI component a value came from; queries decode `+` as a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Path,
    PathSegment,
    Matrix,
    Query,
}

/// Percent-decode a URI component.
pub fn decode(value: &str, component: ComponentType) -> String {
    let value: Cow<'_, str> = if component == ComponentType::Query && value.contains('+') {
        Cow::Owned(value.replace('+', " "))
    } else {
        Cow::Borrowed(value)
    };
    if !value.contains('%') {
        return value.into_owned();
    }
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned(),
    }
}

/// One `/`-delimited segment of a request path together with its matrix
/// parameters (`;name=value` pairs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    path: String,
    matrix_parameters: MultivaluedMap,
}

impl PathSegment {
    /// The empty segment produced by consecutive or trailing slashes.
    pub fn empty() -> Self {
        Self {
            path: String::new(),
            matrix_parameters: MultivaluedMap::new(),
        }
    }

    /// Parse a single segment (without any `/`).
    pub fn parse(segment: &str, decode_values: bool) -> Self {
        let mut parts = segment.split(';');
        let path = parts.next().unwrap_or_default();
        let path = if decode_values {
            decode(path, ComponentType::PathSegment)
        } else {
            path.to_string()
        };
        let mut matrix_parameters = MultivaluedMap::new();
        for param in parts.filter(|p| !p.is_empty()) {
            let (name, value) = param.split_once('=').unwrap_or((param, ""));
            if decode_values {
                matrix_parameters.add(
                    decode(name, ComponentType::Matrix),
                    decode(value, ComponentType::Matrix),
                );
            } else {
                matrix_parameters.add(name, value);
            }
        }
        Self {
            path,
            matrix_parameters,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matrix_parameters(&self) -> &MultivaluedMap {
        &self.matrix_parameters
    }
}

/// Split a path into [`PathSegment`]s.
///
/// A single leading `/` is ignored. Consecutive slashes and a trailing slash
/// produce empty segments, so `"/p//p//p//"` yields seven segments.
///
/// # Arguments
///
/// * `path` - Raw request path relative to the application base
/// * `decode_values` - Percent-decode segment paths and matrix parameters
pub fn decode_path(path: &str, decode_values: bool) -> Vec<PathSegment> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/')
        .map(|segment| {
            if segment.is_empty() {
                PathSegment::empty()
            } else {
                PathSegment::parse(segment, decode_values)
            }
        })
        .collect()
}

/// Parse a raw query string (without the leading `?`).
///
/// Parameters without `=` get an empty value; empty pairs (`a=1&&b=2`) are
/// skipped.
pub fn decode_query(query: &str, decode_values: bool) -> MultivaluedMap {
    let mut params = MultivaluedMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name.is_empty() {
            continue;
        }
        if decode_values {
            params.add(
                decode(name, ComponentType::Query),
                decode(value, ComponentType::Query),
            );
        } else {
            params.add(name, value);
        }
    }
    params
}
