//! Per-request match stack and URI information.

use std::sync::Arc;

use crate::media::MediaType;
use crate::model::{Resource, ResourceMethod};
use crate::uri::{
    decode, decode_path, decode_query, ComponentType, ImmutableMultivaluedMap, MatchResult,
    MultivaluedMap, PathSegment, ReadOnlyList, UriTemplate,
};

use super::tree::RuntimeResource;

#[derive(Debug, Clone)]
struct MatchEntry {
    result: MatchResult,
    template: UriTemplate,
    resource: Option<Arc<RuntimeResource>>,
}

/// Routing state of one request.
///
/// The routing engine pushes an entry for every node whose pattern matched
/// and pops it again when it backtracks past that node. Every accessor
/// returns a read-only snapshot ordered innermost (last matched) first.
///
/// A context is owned by the thread routing the request and is never shared.
#[derive(Debug, Clone)]
pub struct UriRoutingContext {
    path: String,
    query: Option<String>,
    base_path: String,
    entries: Vec<MatchEntry>,
    locators: Vec<Arc<ResourceMethod>>,
    matched_method: Option<(Arc<ResourceMethod>, Option<Arc<Resource>>)>,
    effective_acceptable_type: Option<MediaType>,
}

impl UriRoutingContext {
    /// `path` is the raw routing path relative to `base_path`, with a
    /// leading `/`; `query` the raw query string.
    pub fn new(path: &str, query: Option<&str>, base_path: &str) -> Self {
        Self {
            path: path.to_string(),
            query: query.map(str::to_string),
            base_path: base_path.to_string(),
            entries: Vec::new(),
            locators: Vec::new(),
            matched_method: None,
            effective_acceptable_type: None,
        }
    }

    pub fn push_match(
        &mut self,
        result: MatchResult,
        template: UriTemplate,
        resource: Option<Arc<RuntimeResource>>,
    ) {
        self.entries.push(MatchEntry {
            result,
            template,
            resource,
        });
    }

    /// Remove the innermost match; `None` when the stack is empty.
    pub fn pop_match(&mut self) -> Option<MatchResult> {
        self.entries.pop().map(|e| e.result)
    }

    /// Number of entries on the match stack.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push_locator(&mut self, locator: Arc<ResourceMethod>) {
        self.locators.push(locator);
    }

    pub(crate) fn pop_locator(&mut self) {
        self.locators.pop();
    }

    pub(crate) fn set_matched_resource_method(
        &mut self,
        method: Arc<ResourceMethod>,
        resource: Option<Arc<Resource>>,
    ) {
        self.matched_method = Some((method, resource));
    }

    pub(crate) fn set_effective_acceptable_type(&mut self, media_type: MediaType) {
        self.effective_acceptable_type = Some(media_type);
    }

    pub fn matched_results(&self) -> ReadOnlyList<MatchResult> {
        self.entries.iter().rev().map(|e| e.result.clone()).collect()
    }

    /// Templates of every matched node, including end-of-path nodes.
    pub fn matched_templates(&self) -> ReadOnlyList<UriTemplate> {
        self.entries.iter().rev().map(|e| e.template.clone()).collect()
    }

    pub fn matched_runtime_resources(&self) -> ReadOnlyList<Arc<RuntimeResource>> {
        self.entries
            .iter()
            .rev()
            .filter_map(|e| e.resource.clone())
            .collect()
    }

    /// Model resources of the matched runtime resources.
    pub fn matched_resources(&self) -> ReadOnlyList<Arc<Resource>> {
        self.entries
            .iter()
            .rev()
            .filter_map(|e| e.resource.as_ref())
            .flat_map(|r| r.resources().iter().cloned())
            .collect()
    }

    /// The resource declaring the selected resource method.
    pub fn matched_model_resource(&self) -> Option<Arc<Resource>> {
        self.matched_method.as_ref().and_then(|(_, r)| r.clone())
    }

    pub fn matched_resource_method(&self) -> Option<Arc<ResourceMethod>> {
        self.matched_method.as_ref().map(|(m, _)| Arc::clone(m))
    }

    /// Sub-resource locators invoked on the way to the selected method.
    pub fn matched_resource_locators(&self) -> ReadOnlyList<Arc<ResourceMethod>> {
        self.locators.iter().rev().cloned().collect()
    }

    /// The path prefixes consumed at each matched resource, without leading
    /// or trailing `/`.
    pub fn matched_uris(&self, decode_values: bool) -> ReadOnlyList<String> {
        let mut uris: Vec<String> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter().rev() {
            let remaining = entry.result.right_hand_path();
            let end = self.path.len().saturating_sub(remaining.len());
            let uri = self.path.get(..end).unwrap_or(&self.path);
            let uri = uri.trim_start_matches('/').trim_end_matches('/');
            let uri = if decode_values {
                decode(uri, ComponentType::Path)
            } else {
                uri.to_string()
            };
            if uris.last() != Some(&uri) {
                uris.push(uri);
            }
        }
        uris.into()
    }

    /// Template variables of all matched templates. Values from inner
    /// templates come before outer ones for repeated names.
    pub fn path_parameters(&self, decode_values: bool) -> ImmutableMultivaluedMap {
        let mut parameters = MultivaluedMap::new();
        for entry in &self.entries {
            for (name, value) in entry.result.variables().zip(entry.result.groups()) {
                if let Some(value) = value {
                    let value = if decode_values {
                        decode(value, ComponentType::PathSegment)
                    } else {
                        value.clone()
                    };
                    parameters.add_first(name, value);
                }
            }
        }
        parameters.into_immutable()
    }

    /// Routing path relative to the base path, without the leading `/`.
    pub fn path(&self, decode_values: bool) -> String {
        let path = self.path.strip_prefix('/').unwrap_or(&self.path);
        if decode_values {
            decode(path, ComponentType::Path)
        } else {
            path.to_string()
        }
    }

    pub fn path_segments(&self, decode_values: bool) -> ReadOnlyList<PathSegment> {
        decode_path(&self.path, decode_values).into()
    }

    pub fn query_parameters(&self, decode_values: bool) -> ImmutableMultivaluedMap {
        decode_query(self.query.as_deref().unwrap_or_default(), decode_values).into_immutable()
    }

    /// Base path plus routing path, without the query.
    pub fn absolute_path(&self) -> String {
        let mut uri = self.base_path.trim_end_matches('/').to_string();
        uri.push_str(&self.path);
        uri
    }

    /// Base path plus routing path and query, as received.
    pub fn request_uri(&self) -> String {
        let mut uri = self.absolute_path();
        if let Some(query) = &self.query {
            uri.push('?');
            uri.push_str(query);
        }
        uri
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Combined response type chosen by content negotiation.
    pub fn effective_acceptable_type(&self) -> Option<&MediaType> {
        self.effective_acceptable_type.as_ref()
    }
}
