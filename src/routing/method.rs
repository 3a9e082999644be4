//! Resource method selection: HTTP verb, then consumed type, then produced
//! type negotiated against `Accept`.

use std::cmp::Ordering;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::media::{
    parse_accept, AcceptableMediaType, CombinedMediaType, EffectiveMediaType, MediaType,
    NegotiationOrder, DEFAULT_QUALITY, MINIMUM_QUALITY,
};
use crate::model::{Resource, ResourceMethod};

use super::context::UriRoutingContext;
use super::error::RoutingError;
use super::request::RoutingRequest;

/// One (consumes, produces) combination of a resource method.
#[derive(Debug, Clone)]
struct ConsumesProducesAcceptor {
    consumes: EffectiveMediaType,
    produces: EffectiveMediaType,
    method: Arc<ResourceMethod>,
    resource: Option<Arc<Resource>>,
    method_index: usize,
}

/// A candidate for this particular request.
struct RequestSpecificAcceptor<'a> {
    consumes: CombinedMediaType,
    produces: CombinedMediaType,
    acceptor: &'a ConsumesProducesAcceptor,
}

impl RequestSpecificAcceptor<'_> {
    /// Consumed type first, then produced type.
    fn compare(&self, other: &Self, order: NegotiationOrder) -> Ordering {
        order
            .compare(&self.consumes, &other.consumes)
            .then_with(|| order.compare(&self.produces, &other.produces))
    }
}

/// Outcome of method selection.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Invoke `method`.
    Handler {
        method: Arc<ResourceMethod>,
        /// The response `Content-Type`, set only when the negotiated type is
        /// concrete.
        response_type: Option<MediaType>,
        /// A `HEAD` request served by a `GET` method; the body is dropped.
        head: bool,
    },
    /// Automatic `OPTIONS` answer.
    Options { allow: Vec<Method> },
}

/// Selects a resource method among those bound to one path.
#[derive(Debug, Clone)]
pub struct MethodRouter {
    acceptors: Vec<(Method, Vec<ConsumesProducesAcceptor>)>,
    allow: Vec<Method>,
    order: NegotiationOrder,
}

impl MethodRouter {
    /// Build a router for `methods`, each paired with the resource that
    /// declares it. Sub-resource locators are ignored.
    pub fn new(methods: Vec<(Arc<ResourceMethod>, Option<Arc<Resource>>)>, order: NegotiationOrder) -> Self {
        let mut acceptors: Vec<(Method, Vec<ConsumesProducesAcceptor>)> = Vec::new();
        for (method_index, (method, resource)) in methods.into_iter().enumerate() {
            let Some(verb) = method.http_method().cloned() else {
                continue;
            };
            let bucket = match acceptors.iter().position(|(m, _)| *m == verb) {
                Some(i) => &mut acceptors[i].1,
                None => {
                    acceptors.push((verb, Vec::new()));
                    let last = acceptors.len() - 1;
                    &mut acceptors[last].1
                }
            };
            for consumes in method.effective_consumes() {
                for produces in method.effective_produces() {
                    bucket.push(ConsumesProducesAcceptor {
                        consumes: consumes.clone(),
                        produces,
                        method: Arc::clone(&method),
                        resource: resource.clone(),
                        method_index,
                    });
                }
            }
        }

        let mut allow: Vec<Method> = acceptors.iter().map(|(m, _)| m.clone()).collect();
        if allow.contains(&Method::GET) && !allow.contains(&Method::HEAD) {
            allow.push(Method::HEAD);
        }
        if !allow.contains(&Method::OPTIONS) {
            allow.push(Method::OPTIONS);
        }
        allow.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        Self {
            acceptors,
            allow,
            order,
        }
    }

    /// Verbs answered at this path, including implicit `HEAD` and `OPTIONS`.
    pub fn allow(&self) -> &[Method] {
        &self.allow
    }

    fn acceptors_for(&self, method: &Method) -> Option<&[ConsumesProducesAcceptor]> {
        self.acceptors
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, a)| a.as_slice())
    }

    /// Select the resource method for `request`.
    ///
    /// # Errors
    ///
    /// * `MethodNotAllowed` (405) - no method for the verb
    /// * `BadRequest` (400) - malformed `Content-Type` or `Accept`
    /// * `UnsupportedMediaType` (415) - nothing consumes the request type
    /// * `NotAcceptable` (406) - nothing produces an acceptable type
    pub fn select(
        &self,
        request: &RoutingRequest,
        context: &mut UriRoutingContext,
    ) -> Result<Dispatch, RoutingError> {
        let verb = request.method();
        let (acceptors, head) = match self.acceptors_for(verb) {
            Some(acceptors) => (acceptors, false),
            None if *verb == Method::HEAD => match self.acceptors_for(&Method::GET) {
                Some(acceptors) => (acceptors, true),
                None => return Err(self.not_allowed(verb)),
            },
            None if *verb == Method::OPTIONS => {
                debug!(allow = ?self.allow, "Answering OPTIONS automatically");
                return Ok(Dispatch::Options {
                    allow: self.allow.clone(),
                });
            }
            None => return Err(self.not_allowed(verb)),
        };

        let content_type = match request.content_type() {
            Some(value) => Some(value.parse::<MediaType>().map_err(|e| RoutingError::BadRequest {
                reason: format!("invalid Content-Type '{}': {}", value, e),
            })?),
            None => None,
        };
        let satisfying: Vec<&ConsumesProducesAcceptor> = acceptors
            .iter()
            .filter(|a| {
                content_type
                    .as_ref()
                    .map_or(true, |ct| a.consumes.media_type().is_compatible(ct))
            })
            .collect();
        if satisfying.is_empty() {
            return Err(RoutingError::UnsupportedMediaType {
                content_type: content_type.map(|ct| ct.to_string()).unwrap_or_default(),
            });
        }

        let accept_header = request.accept();
        let acceptable = parse_accept(accept_header.as_deref()).map_err(|e| RoutingError::BadRequest {
            reason: format!("invalid Accept header: {}", e),
        })?;
        let effective_content_type = AcceptableMediaType::with_quality(
            content_type.unwrap_or_else(MediaType::wildcard),
            DEFAULT_QUALITY,
        );

        let mut selected: Option<RequestSpecificAcceptor<'_>> = None;
        let mut same_fitness: Vec<RequestSpecificAcceptor<'_>> = Vec::new();
        for acceptable_type in acceptable.iter().filter(|a| a.quality() > MINIMUM_QUALITY) {
            for acceptor in satisfying.iter().copied() {
                let Some(produces) = CombinedMediaType::combine(acceptable_type, &acceptor.produces) else {
                    continue;
                };
                let Some(consumes) = CombinedMediaType::combine(&effective_content_type, &acceptor.consumes) else {
                    continue;
                };
                let candidate = RequestSpecificAcceptor {
                    consumes,
                    produces,
                    acceptor,
                };
                let ordering = selected
                    .as_ref()
                    .map(|current| (candidate.compare(current, self.order), current.acceptor.method_index));
                match ordering {
                    None | Some((Ordering::Less, _)) => {
                        selected = Some(candidate);
                        same_fitness.clear();
                    }
                    Some((Ordering::Equal, index)) if index != candidate.acceptor.method_index => {
                        same_fitness.push(candidate);
                    }
                    _ => {}
                }
            }
        }

        let Some(selected) = selected else {
            return Err(RoutingError::NotAcceptable {
                accept: accept_header.unwrap_or_else(|| "*/*".to_string()),
            });
        };

        if !same_fitness.is_empty() {
            warn!(
                selected = %selected.acceptor.method.name(),
                selected_produces = %selected.produces,
                ambiguous_with = ?same_fitness.iter().map(|c| c.acceptor.method.name()).collect::<Vec<_>>(),
                accept = ?accept_header,
                "Ambiguous resource method selection, using the first declared"
            );
        }

        let response_type = selected.produces.combined_type().clone();
        context.set_effective_acceptable_type(response_type.clone());
        context.set_matched_resource_method(
            Arc::clone(&selected.acceptor.method),
            selected.acceptor.resource.clone(),
        );
        Ok(Dispatch::Handler {
            method: Arc::clone(&selected.acceptor.method),
            response_type: response_type.is_concrete().then_some(response_type),
            head,
        })
    }

    fn not_allowed(&self, verb: &Method) -> RoutingError {
        RoutingError::MethodNotAllowed {
            method: verb.clone(),
            allow: self.allow.clone(),
        }
    }
}
