use criterion::{black_box, criterion_group, criterion_main, Criterion};
use decoynet::http::headers::RequestHeaders;
use decoynet::http::transaction::build_request;
use http::Method;

fn browser_headers() -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    headers.insert(
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    );
    headers.insert("accept-language", "en-GB,en;q=0.9");
    headers.insert("cache-control", "max-age=0");
    headers.insert("referer", "https://www.pixiv.net/");
    headers.insert("sec-fetch-dest", "image");
    headers.insert("sec-fetch-mode", "no-cors");
    headers.insert("sec-fetch-site", "cross-site");
    headers.insert(
        "user-agent",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    );
    headers
}

fn benchmark_build_request(c: &mut Criterion) {
    let headers = browser_headers();
    c.bench_function("build_request", |b| {
        b.iter(|| {
            build_request(
                black_box(&Method::GET),
                black_box("/img-original/img/2024/01/01/00/00/00/1_p0.png"),
                black_box(&headers),
                black_box("i.pximg.net"),
                black_box(b""),
            )
        })
    });
}

fn benchmark_headers_insert(c: &mut Criterion) {
    c.bench_function("headers_insert", |b| {
        b.iter(|| {
            let mut headers = RequestHeaders::new();
            headers.insert("Accept", "text/html");
            headers.insert("User-Agent", "Mozilla/5.0");
            headers.insert("accept", "image/png");
            black_box(headers)
        })
    });
}

criterion_group!(benches, benchmark_build_request, benchmark_headers_insert);
criterion_main!(benches);
