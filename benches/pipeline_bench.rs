// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use courier::http::{encode, sniff_content_type, Payload};
use serde_json::json;

fn encoding_benchmark(c: &mut Criterion) {
    let payload = Payload::from(json!({
        "user": "alice",
        "tags": ["a", "b", "c"],
        "profile": {"age": 30, "city": "Helsinki"},
        "note": "spaces & symbols = escaped",
    }));

    c.bench_function("encode_form", |b| {
        b.iter(|| black_box(encode(&payload, None).map(|body| body.to_bytes())))
    });

    c.bench_function("encode_json", |b| {
        b.iter(|| black_box(encode(&payload, Some("application/json")).map(|body| body.to_bytes())))
    });

    c.bench_function("encode_xml", |b| {
        b.iter(|| black_box(encode(&payload, Some("application/xml")).map(|body| body.to_bytes())))
    });
}

fn sniff_benchmark(c: &mut Criterion) {
    let bodies: Vec<&[u8]> = vec![
        br#"{"id": 1, "items": [1, 2, 3], "nested": {"ok": true}}"#,
        b"name=alice&tags[]=a&tags[]=b",
        b"plain text body that is neither",
    ];

    c.bench_function("sniff_content_type", |b| {
        b.iter(|| {
            for body in &bodies {
                black_box(sniff_content_type(body));
            }
        })
    });
}

criterion_group!(benches, encoding_benchmark, sniff_benchmark);
criterion_main!(benches);
