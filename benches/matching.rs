use actiondispatch::echo::echo_dispatcher;
use actiondispatch::server::{HttpMethod, Request};
use actiondispatch::Manifest;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn example_manifest() -> &'static str {
    r#"
routers:
  - name: zoo
    actions:
      - { name: root, pattern: /, methods: [GET], controller: zoo, method: root }
      - { name: get_animals, pattern: /zoo/animals, methods: [GET], controller: animals, method: list }
      - { name: create_animal, pattern: /zoo/animals, methods: [POST], controller: animals, method: create }
      - { name: get_animal, pattern: "/zoo/animals/<d:id>", methods: [GET], controller: animals, method: show }
      - { name: update_animal, pattern: "/zoo/animals/<d:id>", methods: [PUT], controller: animals, method: update }
      - { name: animal_toy, pattern: "/zoo/animals/<d:id>/toys/<d:toy_id>", methods: [GET], controller: toys, method: show }
      - name: habitat_section
        pattern: "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}"
        methods: [GET]
        controller: habitats
        method: section
      - name: post_item_batch
        pattern: "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}"
        methods: [POST]
        controller: inventory
        method: batch
      - { name: complex_many_params, pattern: "/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}", controller: zoo, method: complex }
"#
}

fn requests() -> Vec<Request> {
    [
        (HttpMethod::Get, "http://localhost/zoo/animals/123"),
        (HttpMethod::Get, "http://localhost/zoo/animals/123/toys/456"),
        (HttpMethod::Get, "http://localhost/zoo/cats/animals/123/habitats/88/sections/5"),
        (HttpMethod::Post, "http://localhost/inventory/1/feeds/2/items/3/batches/4"),
        (HttpMethod::Get, "http://localhost/complex/1/2/3/4/5/6/7/8/9"),
        (HttpMethod::Get, "http://localhost/does/not/exist"),
    ]
    .into_iter()
    .map(|(method, uri)| Request::new(method, uri).expect("valid request"))
    .collect()
}

fn bench_action_matching(c: &mut Criterion) {
    let manifest = Manifest::from_yaml_str(example_manifest()).expect("valid manifest");
    let dispatcher = echo_dispatcher(manifest).expect("manifest builds");
    let router = &dispatcher.routers()[0];
    let requests = requests();

    c.bench_function("action_match", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(router.resolve(request));
            }
        })
    });

    c.bench_function("full_dispatch", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(dispatcher.respond(request.clone()));
            }
        })
    });
}

criterion_group!(benches, bench_action_matching);
criterion_main!(benches);
