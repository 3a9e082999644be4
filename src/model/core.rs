use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::media::EffectiveMediaType;
use crate::routing::UriRoutingContext;

use super::error::ModelError;

/// A sub-resource locator: instead of producing a response it returns the
/// resource the rest of the path is routed into.
///
/// Implemented for any `Fn(&UriRoutingContext) -> anyhow::Result<LocatorTarget>`.
/// The context reflects the match stack at the point the locator's path was
/// matched, so path parameters of enclosing templates are available.
pub trait SubResourceLocator: Send + Sync {
    fn locate(&self, context: &UriRoutingContext) -> anyhow::Result<LocatorTarget>;
}

impl<F> SubResourceLocator for F
where
    F: Fn(&UriRoutingContext) -> anyhow::Result<LocatorTarget> + Send + Sync,
{
    fn locate(&self, context: &UriRoutingContext) -> anyhow::Result<LocatorTarget> {
        self(context)
    }
}

/// What a resource method does when selected.
#[derive(Clone)]
pub enum MethodKind {
    /// Dispatch to the named handler.
    Handler,
    /// Resolve a sub-resource and keep routing.
    Locator(Arc<dyn SubResourceLocator>),
}

impl fmt::Debug for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Handler => f.write_str("Handler"),
            MethodKind::Locator(_) => f.write_str("Locator(..)"),
        }
    }
}

/// A resource method (HTTP verb + consumes/produces + handler) or a
/// sub-resource locator.
#[derive(Debug, Clone)]
pub struct ResourceMethod {
    name: Arc<str>,
    http_method: Option<Method>,
    consumes: Vec<EffectiveMediaType>,
    produces: Vec<EffectiveMediaType>,
    kind: MethodKind,
}

impl ResourceMethod {
    /// Start declaring a resource method for `http_method`.
    pub fn builder(http_method: Method) -> ResourceMethodBuilder {
        ResourceMethodBuilder {
            http_method,
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    /// A sub-resource locator named `name` (used in logs and diagnostics).
    pub fn locator(name: impl Into<Arc<str>>, locator: impl SubResourceLocator + 'static) -> Self {
        Self {
            name: name.into(),
            http_method: None,
            consumes: Vec::new(),
            produces: Vec::new(),
            kind: MethodKind::Locator(Arc::new(locator)),
        }
    }

    /// Handler name, or the locator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for sub-resource locators.
    pub fn http_method(&self) -> Option<&Method> {
        self.http_method.as_ref()
    }

    /// Declared consumed types; empty when nothing was declared.
    pub fn consumes(&self) -> &[EffectiveMediaType] {
        &self.consumes
    }

    pub fn produces(&self) -> &[EffectiveMediaType] {
        &self.produces
    }

    /// Declared consumed types, or the undeclared `*/*` default.
    pub fn effective_consumes(&self) -> Vec<EffectiveMediaType> {
        effective(&self.consumes)
    }

    pub fn effective_produces(&self) -> Vec<EffectiveMediaType> {
        effective(&self.produces)
    }

    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    pub fn is_locator(&self) -> bool {
        matches!(self.kind, MethodKind::Locator(_))
    }

    pub fn sub_resource_locator(&self) -> Option<&Arc<dyn SubResourceLocator>> {
        match &self.kind {
            MethodKind::Locator(locator) => Some(locator),
            MethodKind::Handler => None,
        }
    }
}

fn effective(declared: &[EffectiveMediaType]) -> Vec<EffectiveMediaType> {
    if declared.is_empty() {
        vec![EffectiveMediaType::wildcard_default()]
    } else {
        declared.to_vec()
    }
}

/// Builder returned by [`ResourceMethod::builder`].
#[derive(Debug, Clone)]
pub struct ResourceMethodBuilder {
    http_method: Method,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl ResourceMethodBuilder {
    /// Add a consumed media type (`@Consumes`).
    pub fn consumes(mut self, media_type: &str) -> Self {
        self.consumes.push(media_type.to_string());
        self
    }

    /// Add a produced media type (`@Produces`), optionally with a `qs`
    /// parameter such as `text/html;qs=0.5`.
    pub fn produces(mut self, media_type: &str) -> Self {
        self.produces.push(media_type.to_string());
        self
    }

    /// Finish the method, bound to the handler called `name`.
    pub fn handled_by(self, name: impl Into<Arc<str>>) -> Result<ResourceMethod, ModelError> {
        let name = name.into();
        let parse = |declared: &[String]| {
            declared
                .iter()
                .map(|media_type| {
                    media_type
                        .parse::<EffectiveMediaType>()
                        .map_err(|source| ModelError::MediaType {
                            method: name.to_string(),
                            media_type: media_type.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let consumes = parse(&self.consumes)?;
        let produces = parse(&self.produces)?;
        Ok(ResourceMethod {
            name: name.clone(),
            http_method: Some(self.http_method),
            consumes,
            produces,
            kind: MethodKind::Handler,
        })
    }
}

/// A resource: an optional path template with resource methods, an optional
/// sub-resource locator and child resources.
///
/// ```
/// use http::Method;
/// use jersey_router::model::{Resource, ResourceMethod};
///
/// let get = ResourceMethod::builder(Method::GET)
///     .produces("application/json")
///     .handled_by("list_orders")
///     .unwrap();
/// let orders = Resource::new("OrdersResource")
///     .with_path("/orders")
///     .with_method(get)
///     .with_child(Resource::new("OrderResource").with_path("{id}"));
/// assert_eq!(orders.children().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Resource {
    name: String,
    path: Option<String>,
    methods: Vec<Arc<ResourceMethod>>,
    locator: Option<Arc<ResourceMethod>>,
    children: Vec<Arc<Resource>>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_method(mut self, method: ResourceMethod) -> Self {
        if method.is_locator() {
            self.locator = Some(Arc::new(method));
        } else {
            self.methods.push(Arc::new(method));
        }
        self
    }

    /// Attach a sub-resource locator at this resource's path.
    pub fn with_locator(
        mut self,
        name: impl Into<Arc<str>>,
        locator: impl SubResourceLocator + 'static,
    ) -> Self {
        self.locator = Some(Arc::new(ResourceMethod::locator(name, locator)));
        self
    }

    pub fn with_child(mut self, child: Resource) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn methods(&self) -> &[Arc<ResourceMethod>] {
        &self.methods
    }

    pub fn locator(&self) -> Option<&Arc<ResourceMethod>> {
        self.locator.as_ref()
    }

    pub fn children(&self) -> &[Arc<Resource>] {
        &self.children
    }

    /// No methods, no locator and no children.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.locator.is_none() && self.children.is_empty()
    }
}

/// Static resource metadata, the equivalent of a resource class.
///
/// Routing trees built for a class are cached for the lifetime of the
/// router, keyed by the identity of the shared `Arc<ResourceClass>`. The
/// name is only used for diagnostics.
#[derive(Debug)]
pub struct ResourceClass {
    name: Arc<str>,
    model: Resource,
}

impl ResourceClass {
    pub fn new(name: impl Into<Arc<str>>, model: Resource) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Resource {
        &self.model
    }
}

/// A resource object returned by a locator. Its identity (the `Arc`
/// allocation) is what the locator cache keys on.
#[derive(Debug)]
pub struct ResourceInstance {
    class: Arc<ResourceClass>,
}

impl ResourceInstance {
    pub fn new(class: Arc<ResourceClass>) -> Self {
        Self { class }
    }

    pub fn class(&self) -> &Arc<ResourceClass> {
        &self.class
    }
}

/// What a sub-resource locator returned.
#[derive(Debug, Clone)]
pub enum LocatorTarget {
    Class(Arc<ResourceClass>),
    Instance(Arc<ResourceInstance>),
    Model(Arc<Resource>),
}

impl LocatorTarget {
    /// The resource model routing continues into.
    pub fn model(&self) -> &Resource {
        match self {
            LocatorTarget::Class(class) => class.model(),
            LocatorTarget::Instance(instance) => instance.class().model(),
            LocatorTarget::Model(resource) => resource,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LocatorTarget::Class(class) => class.name(),
            LocatorTarget::Instance(instance) => instance.class().name(),
            LocatorTarget::Model(resource) => resource.name(),
        }
    }
}

impl From<Arc<ResourceClass>> for LocatorTarget {
    fn from(class: Arc<ResourceClass>) -> Self {
        LocatorTarget::Class(class)
    }
}

impl From<Arc<ResourceInstance>> for LocatorTarget {
    fn from(instance: Arc<ResourceInstance>) -> Self {
        LocatorTarget::Instance(instance)
    }
}

impl From<Arc<Resource>> for LocatorTarget {
    fn from(resource: Arc<Resource>) -> Self {
        LocatorTarget::Model(resource)
    }
}
