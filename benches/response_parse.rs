use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use decoynet::http::response::parse_response;

fn response_with_body(len: usize) -> Bytes {
    let mut raw = b"HTTP/1.0 200 OK\r\n\
        Content-Type: image/png\r\n\
        Cache-Control: max-age=31536000\r\n\
        Server: nginx\r\n\
        \r\n"
        .to_vec();
    raw.extend(std::iter::repeat(0xA5u8).take(len));
    Bytes::from(raw)
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_response");
    for len in [0usize, 16 * 1024, 1024 * 1024] {
        let raw = response_with_body(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &raw, |b, raw| {
            b.iter(|| parse_response(black_box(raw.clone())))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parse);
criterion_main!(benches);
