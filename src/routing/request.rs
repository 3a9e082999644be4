use http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use tracing::warn;

/// The parts of an HTTP request routing looks at.
///
/// The URI is kept raw (percent-encoded); decoding happens on demand in the
/// routing context.
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    method: Method,
    path: String,
    query: Option<String>,
    base_path: String,
    headers: HeaderMap,
}

impl RoutingRequest {
    /// `uri` is a request target such as `/api/orders/1?expand=items`.
    pub fn new(method: Method, uri: &str) -> Self {
        let uri = uri.split('#').next().unwrap_or_default();
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (uri, None),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            method,
            path,
            query,
            base_path: "/".to_string(),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header. Invalid names or values are skipped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Ignoring invalid request header"),
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The application base path the routing path is relative to.
    pub fn base_path(mut self, base_path: &str) -> Self {
        let trimmed = base_path.trim_matches('/');
        self.base_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full raw request path, leading `/` included.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Normalized base path: `/` or `/segment/.../`.
    pub fn base(&self) -> &str {
        &self.base_path
    }

    /// The request path relative to the base path, with a leading `/`.
    ///
    /// `None` when the request lies outside the base path.
    pub fn routing_path(&self) -> Option<&str> {
        if self.base_path == "/" {
            return Some(&self.path);
        }
        let base = self.base_path.trim_end_matches('/');
        let rest = self.path.strip_prefix(base)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// All `Accept` header values joined with `,`; `None` without the header.
    pub fn accept(&self) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}
