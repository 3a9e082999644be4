//! End-to-end routing over a small bookstore model.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use jersey_router::config::{env_key, RoutingConfig, SiblingConflictPolicy, NEGOTIATION_ORDER};
use jersey_router::media::NegotiationOrder;
use jersey_router::model::{LocatorTarget, Resource, ResourceClass, ResourceMethod};
use jersey_router::routing::{Dispatch, Router, RoutingError, RoutingRequest, UriRoutingContext};

fn method(verb: Method, name: &str, consumes: &[&str], produces: &[&str]) -> ResourceMethod {
    let mut builder = ResourceMethod::builder(verb);
    for media_type in consumes {
        builder = builder.consumes(media_type);
    }
    for media_type in produces {
        builder = builder.produces(media_type);
    }
    builder.handled_by(name).unwrap()
}

fn bookstore(config: RoutingConfig) -> Router {
    let reviews = Arc::new(ResourceClass::new(
        "Reviews",
        Resource::new("ReviewsResource")
            .with_method(method(Method::GET, "listReviews", &[], &["application/json"]))
            .with_child(
                Resource::new("Review")
                    .with_path("{review: \\d+}")
                    .with_method(method(Method::GET, "getReview", &[], &["application/json"])),
            ),
    ));

    let books = Resource::new("Books")
        .with_path("/books")
        .with_method(method(
            Method::GET,
            "listBooksJson",
            &[],
            &["application/json"],
        ))
        .with_method(method(
            Method::GET,
            "listBooksHtml",
            &[],
            &["text/html;qs=0.9"],
        ))
        .with_method(method(
            Method::POST,
            "createBook",
            &["application/json"],
            &["application/json"],
        ))
        .with_child(
            Resource::new("Book")
                .with_path("{isbn}")
                .with_method(method(Method::GET, "getBook", &[], &["application/json"]))
                .with_method(method(Method::DELETE, "deleteBook", &[], &[])),
        )
        .with_child(Resource::new("BookReviews").with_path("{isbn}/reviews").with_locator(
            "reviews",
            move |_: &UriRoutingContext| -> anyhow::Result<LocatorTarget> {
                Ok(LocatorTarget::Class(Arc::clone(&reviews)))
            },
        ));

    let search = Resource::new("Search")
        .with_path("search")
        .with_method(method(Method::GET, "search", &[], &["text/plain"]));

    Router::from_resources(vec![books, search], config).unwrap()
}

#[test]
fn test_bookstore_dispatch() {
    let router = bookstore(RoutingConfig::default());

    let cases = [
        (Method::GET, "/books", "application/json", "listBooksJson"),
        (Method::GET, "/books", "text/html", "listBooksHtml"),
        (Method::GET, "/books", "*/*", "listBooksJson"),
        (Method::GET, "/books/978-3", "application/json", "getBook"),
        (Method::DELETE, "/books/978-3", "*/*", "deleteBook"),
        (Method::GET, "/books/978-3/reviews", "application/json", "listReviews"),
        (Method::GET, "/books/978-3/reviews/12", "application/json", "getReview"),
        (Method::GET, "/search?q=rust", "text/plain", "search"),
    ];
    for (verb, uri, accept, expected) in cases {
        let request = RoutingRequest::new(verb.clone(), uri).header("Accept", accept);
        let outcome = router
            .route(&request)
            .unwrap_or_else(|e| panic!("{verb} {uri} failed: {e}"));
        assert_eq!(outcome.handler_name(), Some(expected), "{verb} {uri} ({accept})");
    }
}

#[test]
fn test_bookstore_failures() {
    let router = bookstore(RoutingConfig::default());

    let status = |request: RoutingRequest| router.route(&request).map(|_| ()).unwrap_err().status();

    assert_eq!(status(RoutingRequest::new(Method::GET, "/magazines")), StatusCode::NOT_FOUND);
    assert_eq!(
        status(RoutingRequest::new(Method::GET, "/books/978-3/reviews/latest")),
        StatusCode::NOT_FOUND
    );
    assert_eq!(status(RoutingRequest::new(Method::PUT, "/books")), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        status(RoutingRequest::new(Method::POST, "/books").header("Content-Type", "text/csv")),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
    assert_eq!(
        status(RoutingRequest::new(Method::GET, "/search").header("Accept", "application/json")),
        StatusCode::NOT_ACCEPTABLE
    );
    assert_eq!(
        status(RoutingRequest::new(Method::GET, "/search").header("Accept", "text")),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_review_context_spans_locator() {
    let router = bookstore(RoutingConfig::default());
    let outcome = router
        .route(&RoutingRequest::new(Method::GET, "/books/978-3/reviews/12"))
        .unwrap();
    let context = outcome.context;

    let params = context.path_parameters(true);
    assert_eq!(params.get_first("isbn"), Some("978-3"));
    assert_eq!(params.get_first("review"), Some("12"));
    assert_eq!(context.matched_resource_locators()[0].name(), "reviews");
    assert_eq!(context.matched_model_resource().unwrap().name(), "Review");
    assert_eq!(
        context.matched_uris(true).to_vec(),
        vec!["books/978-3/reviews/12", "books/978-3/reviews", "books"]
    );
}

#[test]
fn test_options_lists_allowed_methods() {
    let router = bookstore(RoutingConfig::default());
    let outcome = router
        .route(&RoutingRequest::new(Method::OPTIONS, "/books/978-3"))
        .unwrap();
    match outcome.dispatch {
        Dispatch::Options { allow } => {
            assert_eq!(allow, vec![Method::DELETE, Method::GET, Method::HEAD, Method::OPTIONS])
        }
        other => panic!("unexpected dispatch {other:?}"),
    }
}

#[test]
fn test_configuration_sources_agree() {
    let toml = RoutingConfig::from_toml_str(
        r#"
        [jersey.config.server.routing]
        "negotiation.order" = "specificity"
        siblingConflict = "merge"
        "#,
    )
    .unwrap();
    assert_eq!(toml.negotiation_order, NegotiationOrder::Specificity);
    assert_eq!(toml.sibling_conflict, SiblingConflictPolicy::Merge);

    let env: HashMap<String, String> = [(env_key(NEGOTIATION_ORDER), "specificity".to_string())]
        .into_iter()
        .collect();
    let from_env = RoutingConfig::from_lookup(|key| env.get(key).cloned());
    assert_eq!(from_env.negotiation_order, NegotiationOrder::Specificity);
}

#[test]
fn test_specificity_order_from_config() {
    let config = RoutingConfig::from_toml_str(
        r#""jersey.config.server.routing.negotiation.order" = "specificity""#,
    )
    .unwrap();
    let resources = || {
        vec![Resource::new("Feed")
            .with_path("feed")
            .with_method(method(Method::GET, "anyFeed", &[], &[]))
            .with_method(method(Method::GET, "atomFeed", &[], &["application/atom+xml"]))]
    };

    let by_specificity = Router::from_resources(resources(), config).unwrap();
    let outcome = by_specificity
        .route(&RoutingRequest::new(Method::GET, "/feed"))
        .unwrap();
    assert_eq!(outcome.handler_name(), Some("atomFeed"));

    let by_distance = Router::from_resources(resources(), RoutingConfig::default()).unwrap();
    let outcome = by_distance.route(&RoutingRequest::new(Method::GET, "/feed")).unwrap();
    assert_eq!(outcome.handler_name(), Some("anyFeed"));
}

#[test]
fn test_locator_error_surfaces_as_internal_error() {
    let router = Router::from_resources(
        vec![Resource::new("Lazy").with_path("lazy").with_locator(
            "load",
            |_: &UriRoutingContext| -> anyhow::Result<LocatorTarget> {
                Err(anyhow::anyhow!("backend unavailable"))
            },
        )],
        RoutingConfig::default(),
    )
    .unwrap();
    let err = router
        .route(&RoutingRequest::new(Method::GET, "/lazy"))
        .unwrap_err();
    assert!(matches!(err, RoutingError::Locator { ref locator, .. } if locator == "load"));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
