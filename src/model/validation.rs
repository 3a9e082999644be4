//! Resource model validation.
//!
//! Issues are collected in an [`ErrorScope`]; validation itself never fails.
//! The caller decides what to do with fatal issues.

use std::sync::Arc;

use crate::errors::ErrorScope;
use crate::uri::UriTemplate;

use super::core::Resource;

/// Validate top-level resources: each needs a parseable path.
pub fn validate(resources: &[Arc<Resource>], scope: &ErrorScope) {
    let guard = scope.enter();
    for resource in resources {
        validate_resource(resource, true, &guard);
    }
}

/// Validate a resource returned by a sub-resource locator. Its own path, if
/// any, is ignored when routing.
pub fn validate_sub_resource(resource: &Resource, scope: &ErrorScope) {
    let guard = scope.enter();
    if let Some(path) = resource.path() {
        guard.hint(
            resource.name(),
            format!("path '{}' of a sub-resource is ignored", path),
        );
    }
    validate_body(resource, &guard);
}

fn validate_resource(resource: &Resource, requires_path: bool, scope: &ErrorScope) {
    match resource.path() {
        None if requires_path => scope.fatal(resource.name(), "resource has no path"),
        None => {}
        Some(path) => {
            if let Err(e) = UriTemplate::new(path) {
                scope.fatal(resource.name(), format!("invalid path template '{}': {}", path, e));
            }
        }
    }
    validate_body(resource, scope);
}

fn validate_body(resource: &Resource, scope: &ErrorScope) {
    if resource.is_empty() {
        scope.hint(resource.name(), "resource has no methods, locator or child resources");
    }
    if !resource.methods().is_empty() && resource.locator().is_some() {
        scope.fatal(
            resource.name(),
            "resource declares both resource methods and a sub-resource locator on the same path",
        );
    }

    let mut seen: Vec<(String, Vec<String>, Vec<String>)> = Vec::new();
    for method in resource.methods() {
        let verb = method
            .http_method()
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let mut consumes: Vec<String> = method.effective_consumes().iter().map(|m| m.media_type().to_string()).collect();
        let mut produces: Vec<String> = method.effective_produces().iter().map(|m| m.media_type().to_string()).collect();
        consumes.sort();
        produces.sort();
        let signature = (verb, consumes, produces);
        if seen.contains(&signature) {
            scope.warning(
                resource.name(),
                format!(
                    "method '{}' duplicates {} consumes {:?} produces {:?}",
                    method.name(),
                    signature.0,
                    signature.1,
                    signature.2
                ),
            );
        } else {
            seen.push(signature);
        }
    }

    for child in resource.children() {
        validate_resource(child, true, scope);
    }
}
