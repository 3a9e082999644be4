use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::config::RoutingConfig;
use crate::model::{ModelError, Resource, ResourceMethod};

use super::builder::{ResourceModelBuilder, RuntimeModelBuilder};
use super::context::UriRoutingContext;
use super::error::RoutingError;
use super::locator::{Clock, LocatorCache};
use super::method::Dispatch;
use super::request::RoutingRequest;
use super::tree::{NodeId, RoutingTree, Terminal};

/// Matching slower than this is logged as a warning.
const SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// A successful routing result: what to invoke and how the path matched.
#[derive(Debug)]
pub struct RouteOutcome {
    pub dispatch: Dispatch,
    pub context: UriRoutingContext,
}

impl RouteOutcome {
    /// Name of the selected resource method, `None` for automatic `OPTIONS`.
    pub fn handler_name(&self) -> Option<&str> {
        match &self.dispatch {
            Dispatch::Handler { method, .. } => Some(method.name()),
            Dispatch::Options { .. } => None,
        }
    }
}

/// One level of the depth-first search: the sibling nodes still to try
/// against the same remaining path.
struct Level {
    tree: Arc<RoutingTree>,
    candidates: Vec<NodeId>,
    next: usize,
    remaining: String,
    /// The node whose children these are; its locator is the fallback.
    owner: Option<NodeId>,
    locator_tried: bool,
    /// Leaving this level pops the owner's match entry.
    pops_match: bool,
    /// Leaving this level pops a locator entry (sub-resource roots).
    pops_locator: bool,
}

impl Level {
    fn new(tree: Arc<RoutingTree>, candidates: Vec<NodeId>, remaining: String) -> Self {
        Self {
            tree,
            candidates,
            next: 0,
            remaining,
            owner: None,
            locator_tried: false,
            pops_match: false,
            pops_locator: false,
        }
    }
}

/// The routing engine.
///
/// Holds the immutable application tree and the sub-resource locator
/// cache, the only state shared between requests. `route` is safe to call
/// from any number of threads at once; each call gets its own
/// [`UriRoutingContext`].
///
/// Matching is a depth-first search with an explicit stack of levels:
///
/// 1. Try the candidates of the top level in order against its remaining
///    path. A match pushes a context entry and a new level for the node's
///    children with the right-hand path as the new remaining path.
/// 2. A node with a method router whose match consumed the whole path ends
///    the search; method selection failures (405/406/415/400) are final.
/// 3. An exhausted level whose owner has a sub-resource locator invokes it
///    once and continues into the resolved subtree with the same remaining
///    path.
/// 4. Otherwise the level is popped along with the context entries it
///    pushed, and the search continues with the parent's next sibling.
pub struct Router {
    tree: Arc<RoutingTree>,
    locator_cache: LocatorCache,
    model_builder: Arc<dyn ResourceModelBuilder>,
    config: RoutingConfig,
}

impl Router {
    /// Build the routing tree for `resources`.
    ///
    /// # Errors
    ///
    /// `ModelError::Validation` when the model has fatal issues and
    /// `ignore_validation_errors` is off.
    pub fn from_resources(resources: Vec<Resource>, config: RoutingConfig) -> Result<Self, ModelError> {
        let resources: Vec<Arc<Resource>> = resources.into_iter().map(Arc::new).collect();
        let builder = RuntimeModelBuilder::new(config.clone());
        let tree = builder.build_root(&resources)?;
        Ok(Self::assemble(tree, config, Arc::new(builder)))
    }

    /// Route over a tree assembled by hand.
    pub fn from_tree(tree: RoutingTree, config: RoutingConfig) -> Self {
        let builder = Arc::new(RuntimeModelBuilder::new(config.clone()));
        Self::assemble(tree, config, builder)
    }

    fn assemble(
        tree: RoutingTree,
        config: RoutingConfig,
        model_builder: Arc<dyn ResourceModelBuilder>,
    ) -> Self {
        Self {
            tree: Arc::new(tree),
            locator_cache: LocatorCache::new(config.locator_cache.clone()),
            model_builder,
            config,
        }
    }

    /// Replace the builder used for sub-resource locator targets.
    pub fn with_model_builder(mut self, model_builder: Arc<dyn ResourceModelBuilder>) -> Self {
        self.model_builder = model_builder;
        self
    }

    /// Use `clock` for locator cache aging. Drops anything cached so far.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.locator_cache = LocatorCache::with_clock(self.config.locator_cache.clone(), clock);
        self
    }

    pub fn tree(&self) -> &RoutingTree {
        &self.tree
    }

    pub fn locator_cache(&self) -> &LocatorCache {
        &self.locator_cache
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Route `request` to a resource method.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no path matched, or the request is outside the base path
    /// * `MethodNotAllowed`, `UnsupportedMediaType`, `NotAcceptable`,
    ///   `BadRequest` - the path matched but method selection failed
    /// * `Locator`, `Model` - a sub-resource locator or its subtree failed
    pub fn route(&self, request: &RoutingRequest) -> Result<RouteOutcome, RoutingError> {
        let method = request.method();
        let path = request.path();
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = Instant::now();
        let result = self.traverse(request);
        let match_duration = match_start.elapsed();

        match &result {
            Ok(outcome) => {
                let handler_name = outcome.handler_name().unwrap_or("OPTIONS");
                let route_pattern: String = outcome
                    .context
                    .matched_templates()
                    .iter()
                    .rev()
                    .map(|t| t.template())
                    .collect();
                if match_duration > SLOW_MATCH_THRESHOLD {
                    warn!(
                        method = %method,
                        path = %path,
                        handler_name = %handler_name,
                        route_pattern = %route_pattern,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    info!(
                        method = %method,
                        path = %path,
                        handler_name = %handler_name,
                        route_pattern = %route_pattern,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
            }
            Err(RoutingError::NotFound { .. }) => {
                warn!(
                    method = %method,
                    path = %path,
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
            }
            Err(e) => {
                warn!(
                    method = %method,
                    path = %path,
                    status = e.status().as_u16(),
                    error = %e,
                    duration_us = match_duration.as_micros(),
                    "Route rejected"
                );
            }
        }
        result
    }

    fn traverse(&self, request: &RoutingRequest) -> Result<RouteOutcome, RoutingError> {
        let Some(routing_path) = request.routing_path() else {
            debug!(path = %request.path(), base_path = %request.base(), "Request outside base path");
            return Err(RoutingError::NotFound {
                path: request.path().to_string(),
            });
        };
        let routing_path = if routing_path.is_empty() { "/" } else { routing_path };

        let mut context = UriRoutingContext::new(routing_path, request.query(), request.base());
        let mut stack = vec![Level::new(
            Arc::clone(&self.tree),
            self.tree.roots().to_vec(),
            routing_path.to_string(),
        )];

        while let Some(level) = stack.last_mut() {
            if let Some(id) = level.candidates.get(level.next).copied() {
                level.next += 1;
                let tree = Arc::clone(&level.tree);
                let node = tree.node(id);
                let Some(result) = node.pattern().match_path(&level.remaining) else {
                    continue;
                };

                let remaining = result.right_hand_path().to_string();
                let end_of_path = result.is_end_of_path();
                context.push_match(result, node.pattern().template().clone(), node.resource().cloned());

                if let (Some(Terminal::Methods(methods)), true) = (node.terminal(), end_of_path) {
                    let dispatch = methods.select(request, &mut context)?;
                    return Ok(RouteOutcome { dispatch, context });
                }

                let mut child = Level::new(Arc::clone(&tree), node.children().to_vec(), remaining);
                child.owner = Some(id);
                child.pops_match = true;
                stack.push(child);
                continue;
            }

            if !level.locator_tried {
                level.locator_tried = true;
                let locator = level
                    .owner
                    .and_then(|owner| match level.tree.node(owner).terminal() {
                        Some(Terminal::Locator(locator)) => Some(Arc::clone(locator)),
                        _ => None,
                    });
                if let Some(locator) = locator {
                    let remaining = level.remaining.clone();
                    let subtree = self.resolve_locator(&locator, &context)?;
                    context.push_locator(locator);
                    let mut sub = Level::new(Arc::clone(&subtree), subtree.roots().to_vec(), remaining);
                    sub.pops_locator = true;
                    stack.push(sub);
                    continue;
                }
            }

            if let Some(done) = stack.pop() {
                if done.pops_match {
                    context.pop_match();
                }
                if done.pops_locator {
                    context.pop_locator();
                }
            }
        }

        Err(RoutingError::NotFound {
            path: request.path().to_string(),
        })
    }

    /// Invoke `locator` and resolve its result to a subtree through the cache.
    fn resolve_locator(
        &self,
        locator: &Arc<ResourceMethod>,
        context: &UriRoutingContext,
    ) -> Result<Arc<RoutingTree>, RoutingError> {
        let Some(sub_resource_locator) = locator.sub_resource_locator() else {
            return Err(RoutingError::Locator {
                locator: locator.name().to_string(),
                error: anyhow!("resource method is not a sub-resource locator"),
            });
        };
        let target = sub_resource_locator
            .locate(context)
            .map_err(|error| RoutingError::Locator {
                locator: locator.name().to_string(),
                error,
            })?;
        debug!(
            locator = %locator.name(),
            target_name = %target.name(),
            "Sub-resource locator invoked"
        );
        let subtree = self
            .locator_cache
            .resolve(&target, |target| self.model_builder.build(target))?;
        Ok(subtree)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("tree", &self.tree)
            .field("locator_cache", &self.locator_cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
