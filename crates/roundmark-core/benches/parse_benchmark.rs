//! Benchmarks comparing Roundmark parsing vs pulldown-cmark
//!
//! Run with: cargo bench -p roundmark-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pulldown_cmark::{Options, Parser as MdParser};
use roundmark_core::lexer::split_lines;
use roundmark_core::{Parser, RoundTrip, Serializer};

/// Sample document using every construct the scanner knows
const SAMPLE: &str = r#"# Introduction

This is a paragraph with [a link](https://example.com) and inline math $a^2 + b^2$.
It also carries mid-line display math $$\sum_{i=0}^n i$$ before the end.

## Lists

- First item with some content
- Second item with [a reference](https://docs.rs)
  - Nested item with $x_i$
    * Deeper still
1. Step one of the process
2. Step two continues
3. Step three completes

## Code Example

```rust
fn fibonacci(n: u64) -> u64 {
    match n {
        0 => 0,
        1 => 1,
        _ => fibonacci(n - 1) + fibonacci(n - 2),
    }
}
```

~~~text
```
nested fence stays content
```
~~~

## Math

$$
\int_0^\infty e^{-x^2} dx = \frac{\sqrt{\pi}}{2}
$$

![diagram](img/diagram.png)
[Project home](https://example.com/roundmark)

End of document.
"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.throughput(Throughput::Bytes(SAMPLE.len() as u64));

    group.bench_function("roundmark", |b| {
        b.iter(|| {
            let result = Parser::new().parse_str(black_box(SAMPLE)).unwrap();
            black_box(result.entities.len())
        })
    });

    group.bench_function("markdown_pulldown", |b| {
        b.iter(|| {
            let parser = MdParser::new_ext(black_box(SAMPLE), Options::all());
            let events: Vec<_> = parser.collect();
            black_box(events.len())
        })
    });

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    let lines = split_lines(SAMPLE, "\n").unwrap();
    let entities = Parser::new().parse(&lines);
    let serializer = Serializer::new();

    group.throughput(Throughput::Bytes(SAMPLE.len() as u64));

    group.bench_function("roundmark", |b| {
        b.iter(|| black_box(serializer.serialize(black_box(&entities))).len())
    });

    group.bench_function("round_trip_check", |b| {
        let rt = RoundTrip::new();
        b.iter(|| {
            let report = rt.check(black_box(SAMPLE)).unwrap();
            black_box(report.reconstructed.len())
        })
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for size in [1, 5, 10, 20].iter() {
        let content: String = SAMPLE.repeat(*size);

        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("roundmark", size), &content, |b, content| {
            b.iter(|| {
                let result = Parser::new().parse_str(black_box(content)).unwrap();
                black_box(result.entities.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("markdown", size), &content, |b, content| {
            b.iter(|| {
                let parser = MdParser::new_ext(black_box(content), Options::all());
                let events: Vec<_> = parser.collect();
                black_box(events.len())
            })
        });
    }

    group.finish();
}

fn bench_inline_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline");

    let inline = "This has $x$, $$y$$, [link](https://example.com), an unmatched $ and [bracket.";

    group.bench_function("roundmark_inline", |b| {
        b.iter(|| {
            let spans = roundmark_core::inline::scan_inline(black_box(inline));
            black_box(spans.len())
        })
    });

    group.bench_function("markdown_inline", |b| {
        b.iter(|| {
            let parser = MdParser::new_ext(black_box(inline), Options::all());
            let events: Vec<_> = parser.collect();
            black_box(events.len())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_serialize,
    bench_scaling,
    bench_inline_scanning
);
criterion_main!(benches);
