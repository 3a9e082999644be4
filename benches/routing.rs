use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use jersey_router::config::RoutingConfig;
use jersey_router::media::{parse_accept, sort_candidates, CombinedMediaType, EffectiveMediaType, NegotiationOrder};
use jersey_router::model::{LocatorTarget, Resource, ResourceClass, ResourceMethod};
use jersey_router::routing::{Router, RoutingRequest, UriRoutingContext};

fn get(name: &str, produces: &[&str]) -> ResourceMethod {
    let mut builder = ResourceMethod::builder(Method::GET);
    for media_type in produces {
        builder = builder.produces(media_type);
    }
    builder.handled_by(name).expect("valid media types")
}

fn zoo_router() -> Router {
    let toys = Arc::new(ResourceClass::new(
        "Toys",
        Resource::new("ToysResource")
            .with_method(get("list_toys", &["application/json"]))
            .with_child(
                Resource::new("Toy")
                    .with_path("{toy_id}")
                    .with_method(get("get_toy", &["application/json"])),
            ),
    ));

    let animals = Resource::new("Animals")
        .with_path("/zoo/animals")
        .with_method(get("get_animals", &["application/json", "text/html;qs=0.5"]))
        .with_child(
            Resource::new("Animal")
                .with_path("{id}")
                .with_method(get("get_animal", &["application/json"])),
        )
        .with_child(Resource::new("AnimalToys").with_path("{id}/toys").with_locator(
            "toys",
            move |_: &UriRoutingContext| -> anyhow::Result<LocatorTarget> {
                Ok(LocatorTarget::Class(Arc::clone(&toys)))
            },
        ));

    let habitats = Resource::new("Sections")
        .with_path("/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}")
        .with_method(get("habitat_section", &[]));

    let complex = Resource::new("Complex")
        .with_path("/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}")
        .with_method(get("complex_many_params", &[]));

    Router::from_resources(vec![animals, habitats, complex], RoutingConfig::default())
        .expect("valid resource model")
}

fn bench_route_throughput(c: &mut Criterion) {
    let router = zoo_router();
    let requests: Vec<RoutingRequest> = [
        "/zoo/animals",
        "/zoo/animals/123",
        "/zoo/animals/123/toys/456",
        "/zoo/cats/animals/123/habitats/88/sections/5",
        "/complex/1/2/3/4/5/6/7/8/9",
    ]
    .iter()
    .map(|path| RoutingRequest::new(Method::GET, path).header("Accept", "application/json, text/*;q=0.5"))
    .collect();

    c.bench_function("route_match", |b| {
        b.iter(|| {
            for request in &requests {
                let res = router.route(request);
                black_box(&res);
            }
        })
    });
}

fn bench_negotiation(c: &mut Criterion) {
    let produces: Vec<EffectiveMediaType> = ["application/json", "application/xml;qs=0.8", "text/html;qs=0.5", "text/plain"]
        .iter()
        .map(|t| t.parse().expect("valid media type"))
        .collect();
    let header = "text/html;q=0.9, application/xhtml+xml, application/xml;q=0.8, */*;q=0.1";

    c.bench_function("accept_negotiation", |b| {
        b.iter(|| {
            let accept = parse_accept(Some(black_box(header))).expect("valid Accept header");
            let mut candidates: Vec<CombinedMediaType> = accept
                .iter()
                .flat_map(|a| produces.iter().filter_map(move |p| CombinedMediaType::combine(a, p)))
                .collect();
            sort_candidates(&mut candidates, NegotiationOrder::Distance);
            black_box(candidates.first().cloned())
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_negotiation);
criterion_main!(benches);
