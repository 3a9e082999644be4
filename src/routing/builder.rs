//! # Routing Tree Construction
//!
//! Compiles a resource model into a [`RoutingTree`]. Every resource becomes
//! a node guarded by `template(/.*)?`:
//!
//! ```text
//! /orders(/.*)?                      resource node
//!   /{id}(/.*)?                      child resource, most specific first
//!     (/)?      -> methods [GET]     end-of-path node with the method router
//!   /{id}/items(/.*)? -> locator     sub-resource locator as fallback terminal
//!   (/)?        -> methods [GET, POST]
//! ```
//!
//! Siblings are ordered by [`UriTemplate::specificity_cmp`]; siblings whose
//! templates compile to the same expression are handled according to the
//! configured [`SiblingConflictPolicy`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{RoutingConfig, SiblingConflictPolicy};
use crate::errors::{ErrorScope, ScopeGuard};
use crate::model::{validate, validate_sub_resource, LocatorTarget, ModelError, Resource};
use crate::uri::{PathPattern, RightHandPath, UriTemplate};

use super::method::MethodRouter;
use super::tree::{NodeId, RoutingTree, RuntimeResource, Terminal};

/// Turns what a sub-resource locator returned into a routing subtree.
///
/// The router calls this only on locator cache misses. The returned tree's
/// roots are matched against the path left over after the locator's node.
pub trait ResourceModelBuilder: Send + Sync {
    fn build(&self, target: &LocatorTarget) -> Result<RoutingTree, ModelError>;
}

/// The default model builder.
#[derive(Debug, Clone, Default)]
pub struct RuntimeModelBuilder {
    config: RoutingConfig,
}

impl RuntimeModelBuilder {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Build the application tree from top-level resources.
    ///
    /// # Errors
    ///
    /// `ModelError::Validation` when fatal model issues were found and
    /// `ignore_validation_errors` is off.
    pub fn build_root(&self, resources: &[Arc<Resource>]) -> Result<RoutingTree, ModelError> {
        let scope = ErrorScope::new();
        let guard = scope.enter();
        if !self.config.validation_disabled {
            validate(resources, &guard);
        }

        let mut tree = RoutingTree::new();
        for root in self.add_siblings(&mut tree, resources, &guard) {
            tree.add_root(root);
        }
        self.finish(guard)?;

        info!(
            resources = resources.len(),
            nodes = tree.len(),
            roots = tree.roots().len(),
            "Routing tree built"
        );
        debug!(tree = ?tree, "Routing tree layout");
        Ok(tree)
    }

    fn add_siblings(
        &self,
        tree: &mut RoutingTree,
        resources: &[Arc<Resource>],
        scope: &ErrorScope,
    ) -> Vec<NodeId> {
        let mut groups: Vec<(UriTemplate, Vec<Arc<Resource>>)> = Vec::new();
        for resource in resources {
            // Validation reports missing and malformed paths.
            let Some(path) = resource.path() else {
                debug!(resource = %resource.name(), "Skipping resource without path");
                continue;
            };
            let template = match UriTemplate::new(path) {
                Ok(template) => template,
                Err(e) => {
                    debug!(resource = %resource.name(), error = %e, "Skipping resource with invalid path");
                    continue;
                }
            };
            match groups
                .iter_mut()
                .find(|(t, _)| t.regex_source() == template.regex_source())
            {
                Some((_, members)) => members.push(Arc::clone(resource)),
                None => groups.push((template, vec![Arc::clone(resource)])),
            }
        }
        groups.sort_by(|(a, _), (b, _)| a.specificity_cmp(b));

        groups
            .into_iter()
            .filter_map(|(template, members)| {
                let members = self.resolve_conflict(&template, members, scope);
                self.add_resource(tree, template, members, scope)
            })
            .collect()
    }

    fn resolve_conflict(
        &self,
        template: &UriTemplate,
        mut members: Vec<Arc<Resource>>,
        scope: &ErrorScope,
    ) -> Vec<Arc<Resource>> {
        if members.len() < 2 {
            return members;
        }
        let first = members[0].name().to_string();
        match self.config.sibling_conflict {
            SiblingConflictPolicy::Merge => {
                debug!(
                    template = %template,
                    resources = ?members.iter().map(|r| r.name()).collect::<Vec<_>>(),
                    "Merging sibling resources"
                );
                return members;
            }
            SiblingConflictPolicy::FirstWins => {
                for shadowed in &members[1..] {
                    scope.warning(
                        shadowed.name(),
                        format!(
                            "path '{}' is already bound to resource '{}', this resource is unreachable",
                            template, first
                        ),
                    );
                }
            }
            SiblingConflictPolicy::Reject => {
                for shadowed in &members[1..] {
                    scope.fatal(
                        shadowed.name(),
                        format!("path '{}' conflicts with resource '{}'", template, first),
                    );
                }
            }
        }
        members.truncate(1);
        members
    }

    fn add_resource(
        &self,
        tree: &mut RoutingTree,
        template: UriTemplate,
        members: Vec<Arc<Resource>>,
        scope: &ErrorScope,
    ) -> Option<NodeId> {
        let pattern = match PathPattern::from_template(
            template.clone(),
            RightHandPath::CapturingZeroOrMoreSegments,
        ) {
            Ok(pattern) => pattern,
            Err(e) => {
                let name = members.first().map(|r| r.name()).unwrap_or_default();
                scope.fatal(name, format!("path template '{}' does not compile: {}", template, e));
                return None;
            }
        };
        let node = tree.add_node(pattern);
        tree.set_resource(node, Arc::new(RuntimeResource::new(template, members.clone())));
        self.attach_members(tree, node, &members, scope);
        Some(node)
    }

    /// Children, methods and locator of `members` below `node`.
    fn attach_members(
        &self,
        tree: &mut RoutingTree,
        node: NodeId,
        members: &[Arc<Resource>],
        scope: &ErrorScope,
    ) {
        let children: Vec<Arc<Resource>> = members
            .iter()
            .flat_map(|r| r.children().iter().cloned())
            .collect();
        for child in self.add_siblings(tree, &children, scope) {
            tree.add_child(node, child);
        }

        let methods: Vec<_> = members
            .iter()
            .flat_map(|r| {
                r.methods()
                    .iter()
                    .map(move |m| (Arc::clone(m), Some(Arc::clone(r))))
            })
            .collect();
        if !methods.is_empty() {
            let end = tree.add_node(PathPattern::end_of_path());
            tree.set_terminal(
                end,
                Terminal::Methods(MethodRouter::new(methods, self.config.negotiation_order)),
            );
            tree.add_child(node, end);
        }

        if let Some(locator) = members.iter().find_map(|r| r.locator()) {
            tree.set_terminal(node, Terminal::Locator(Arc::clone(locator)));
        }
    }

    fn finish(&self, guard: ScopeGuard<'_>) -> Result<(), ModelError> {
        match guard.finish() {
            Ok(()) => Ok(()),
            Err(errors) if self.config.ignore_validation_errors => {
                warn!(
                    fatal_issues = errors.fatal_count(),
                    "Ignoring fatal resource model issues"
                );
                Ok(())
            }
            Err(errors) => Err(ModelError::Validation(errors)),
        }
    }
}

impl ResourceModelBuilder for RuntimeModelBuilder {
    /// The sub-resource becomes a single root with an empty template, so its
    /// methods answer the locator's own path and its children continue below
    /// it. A path declared on the sub-resource itself is ignored.
    fn build(&self, target: &LocatorTarget) -> Result<RoutingTree, ModelError> {
        let model = match target {
            LocatorTarget::Model(model) => Arc::clone(model),
            _ => Arc::new(target.model().clone()),
        };

        let scope = ErrorScope::new();
        let guard = scope.enter();
        if !self.config.validation_disabled {
            validate_sub_resource(&model, &guard);
        }

        let mut tree = RoutingTree::new();
        let template = UriTemplate::empty();
        let pattern = PathPattern::from_template(template.clone(), RightHandPath::CapturingZeroOrMoreSegments)
            .map_err(|source| ModelError::Template {
                resource: model.name().to_string(),
                source,
            })?;
        let root = tree.add_node(pattern);
        let members = vec![model];
        tree.set_resource(root, Arc::new(RuntimeResource::new(template, members.clone())));
        self.attach_members(&mut tree, root, &members, &guard);
        tree.add_root(root);
        self.finish(guard)?;

        debug!(
            target_name = %target.name(),
            nodes = tree.len(),
            "Sub-resource routing tree built"
        );
        Ok(tree)
    }
}
