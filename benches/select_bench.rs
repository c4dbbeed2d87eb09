// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sizzle::{parse_html, Engine, EngineConfig};

fn sample_document() -> String {
    let mut html = String::from("<div id=\"content\">");
    for i in 0..200 {
        html.push_str(&format!(
            "<section class=\"s{}\"><ul><li class=\"item\">{}</li><li>b</li><li class=\"item last\">c</li></ul>\
             <form><input type=\"text\" name=\"q{}\"><input type=\"submit\"></form></section>",
            i % 7,
            i,
            i
        ));
    }
    html.push_str("</div>");
    html
}

fn tokenize_benchmark(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::new().cache_size(1)).unwrap();
    let selectors = ["#content > section ul li.item:nth-child(2n+1)", "div a", "input[type=submit]"];

    c.bench_function("tokenize_uncached", |b| {
        b.iter(|| {
            for selector in &selectors {
                black_box(sizzle::selector::tokenize(selector).unwrap());
            }
        })
    });

    c.bench_function("tokenize_cached", |b| {
        b.iter(|| black_box(engine.tokenize(selectors[0]).unwrap()))
    });
}

fn select_benchmark(c: &mut Criterion) {
    let doc = parse_html(&sample_document()).unwrap();

    c.bench_function("select_descendant", |b| {
        b.iter(|| black_box(doc.select("section ul li.item").unwrap().len()))
    });

    c.bench_function("select_nth_child", |b| {
        b.iter(|| black_box(doc.select("li:nth-child(odd)").unwrap().len()))
    });

    c.bench_function("select_positional", |b| {
        b.iter(|| black_box(doc.select("section:gt(10) li:first").unwrap().len()))
    });

    c.bench_function("select_fast_path", |b| {
        b.iter(|| black_box(doc.select(".item").unwrap().len()))
    });

    c.bench_function("matches_in_set", |b| {
        let inputs = doc.select("input").unwrap();
        b.iter(|| black_box(doc.filter(&inputs, ":text:not([name$=\"7\"])").unwrap().len()))
    });
}

criterion_group!(benches, tokenize_benchmark, select_benchmark);
criterion_main!(benches);
