//! # Routing Module
//!
//! Request routing over a tree of path-pattern guarded nodes, resource
//! method selection with content negotiation, and sub-resource locators.
//!
//! ## Overview
//!
//! - [`RuntimeModelBuilder`] compiles a resource model into an arena
//!   [`RoutingTree`]
//! - [`Router`] walks the tree depth-first with backtracking and records the
//!   match stack in a per-request [`UriRoutingContext`]
//! - [`MethodRouter`] picks the resource method for the verb, the request
//!   `Content-Type` and the `Accept` header
//! - [`LocatorCache`] memoizes the subtrees built for sub-resource locator
//!   results
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use jersey_router::config::RoutingConfig;
//! use jersey_router::model::{Resource, ResourceMethod};
//! use jersey_router::routing::{Router, RoutingRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let get = ResourceMethod::builder(Method::GET)
//!     .produces("application/json")
//!     .handled_by("getOrder")?;
//! let orders = Resource::new("Orders")
//!     .with_path("/orders")
//!     .with_child(Resource::new("Order").with_path("{id}").with_method(get));
//!
//! let router = Router::from_resources(vec![orders], RoutingConfig::default())?;
//! let request = RoutingRequest::new(Method::GET, "/orders/42").header("Accept", "application/json");
//! let outcome = router.route(&request)?;
//! assert_eq!(outcome.handler_name(), Some("getOrder"));
//! assert_eq!(outcome.context.path_parameters(true).get_first("id"), Some("42"));
//! # Ok(())
//! # }
//! ```

mod builder;
mod context;
mod engine;
mod error;
mod locator;
mod method;
mod request;
mod tree;


pub use builder::{ResourceModelBuilder, RuntimeModelBuilder};
pub use context::UriRoutingContext;
pub use engine::{RouteOutcome, Router};
pub use error::RoutingError;
pub use locator::{Clock, LocatorCache, LocatorKey, ManualClock, SystemClock};
pub use method::{Dispatch, MethodRouter};
pub use request::RoutingRequest;
pub use tree::{NodeId, RouterNode, RoutingTree, RuntimeResource, Terminal};
