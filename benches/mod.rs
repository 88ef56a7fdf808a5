use criterion::{criterion_group, criterion_main};

mod http;

criterion_group!(
    benches,
    http::parser::bench_request_parsing,
    http::parser::bench_post_params,
    http::parser::bench_multipart_scan
);
criterion_main!(benches);
