//! # jersey-router
//!
//! JAX-RS style request routing for Rust: URI template matching over a
//! backtracking routing tree, sub-resource locators with a concurrent
//! subtree cache, and media-type content negotiation with `q`/`qs`
//! weighting.
//!
//! ## Architecture
//!
//! - **[`media`]** - media types, `Accept` parsing, the media-type combiner
//!   and the candidate orderings
//! - **[`uri`]** - URI templates, path patterns, path segment / matrix /
//!   query decoding and read-only multi-valued maps
//! - **[`model`]** - the resource model applications declare: resources,
//!   resource methods, sub-resource locators, and its validation
//! - **[`routing`]** - the routing tree, the routing engine, resource method
//!   selection, the locator cache and the per-request routing context
//! - **[`errors`]** - scoped collection of model issues
//! - **[`config`]** - property, TOML and environment driven configuration
//! - **[`logging`]** - `tracing-subscriber` initialisation
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Router as routing::Router
//!     participant Tree as RoutingTree
//!     participant Cache as LocatorCache
//!     participant Methods as MethodRouter
//!
//!     App->>Router: route(&RoutingRequest)
//!     Router->>Tree: depth-first match, push context entries
//!     alt locator node and no child matched
//!         Router->>Cache: resolve(locator result)
//!         Cache-->>Router: subtree (cached or freshly built)
//!         Router->>Tree: continue into subtree
//!     end
//!     Router->>Methods: select(verb, Content-Type, Accept)
//!     Methods-->>Router: Dispatch or 405/406/415/400
//!     Router-->>App: RouteOutcome { dispatch, context }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use jersey_router::{Resource, ResourceMethod, Router, RoutingConfig, RoutingRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let list = ResourceMethod::builder(Method::GET)
//!     .produces("application/json")
//!     .produces("text/html;qs=0.5")
//!     .handled_by("listOrders")?;
//! let router = Router::from_resources(
//!     vec![Resource::new("Orders").with_path("/orders").with_method(list)],
//!     RoutingConfig::default(),
//! )?;
//!
//! let outcome = router.route(&RoutingRequest::new(Method::GET, "/orders"))?;
//! assert_eq!(outcome.handler_name(), Some("listOrders"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`RoutingConfig`] reads the `jersey.config.server.*` properties from a
//! property map, a TOML document or `JERSEY_*` environment variables. See
//! [`config`] for the recognised keys.

pub mod config;
pub mod errors;
pub mod logging;
pub mod media;
pub mod model;
pub mod routing;
pub mod uri;

pub use config::RoutingConfig;
pub use errors::{ErrorMessage, ErrorMessagesError, ErrorScope, Severity};
pub use media::{CombinedMediaType, EffectiveMediaType, MediaType, NegotiationOrder};
pub use model::{LocatorTarget, ModelError, Resource, ResourceClass, ResourceInstance, ResourceMethod};
pub use routing::{Dispatch, RouteOutcome, Router, RoutingError, RoutingRequest, UriRoutingContext};
