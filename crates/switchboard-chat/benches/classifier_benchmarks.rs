//! Benchmarks for intent classification and parameter extraction.
//!
//! Classification runs on every text turn before any tool call, so it has
//! to stay far below the cost of the cheapest tool (well under 1ms).

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use switchboard_chat::{IntentClassifier, ParameterExtractor};

/// Messages spread across every rule, including the default.
fn sample_message(index: usize) -> String {
    match index % 10 {
        0 => format!("send an email to user{}@example.com about the meeting on 5 June 2025 at 3 PM", index),
        1 => "summarize the pdf I sent earlier".to_string(),
        2 => "please extract text from the image".to_string(),
        3 => "latest india news headlines".to_string(),
        4 => format!("what's the weather like in city number {}", index),
        5 => format!("calculate {} * 20 + 7", index),
        6 => "what time is it in Tokyo".to_string(),
        7 => format!("convert {} km to miles", index),
        8 => "can you explain how transformers work in machine learning".to_string(),
        _ => "Where is it used in practice, and what about the tradeoffs?".to_string(),
    }
}

fn bench_classify(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let messages: Vec<String> = (0..1000).map(sample_message).collect();

    // Compile the regex sets outside the measurement.
    classifier.classify("warm up");

    let mut group = c.benchmark_group("classifier");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("classify_single", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let capability = classifier.classify(&messages[idx % messages.len()]);
            idx += 1;
            capability
        });
    });

    // Conversation turns walk the whole cascade.
    group.bench_function("classify_default_path", |b| {
        b.iter(|| classifier.classify("tell me something interesting about octopuses"));
    });

    group.bench_function("classify_batch_100", |b| {
        b.iter(|| {
            messages[..100]
                .iter()
                .map(|m| classifier.classify(m))
                .collect::<Vec<_>>()
        });
    });

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let extractor = ParameterExtractor::default();
    let messages: Vec<String> = (0..1000).map(sample_message).collect();

    let mut group = c.benchmark_group("extractor");
    group.sample_size(200);

    group.bench_function("classify_and_extract", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let message = &messages[idx % messages.len()];
            idx += 1;
            classifier
                .classify(message)
                .map(|capability| extractor.extract(capability, message))
        });
    });

    group.finish();
}

/// p95 latency of a single classification, asserted against 1ms.
fn bench_classify_latency_assertion(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let messages: Vec<String> = (0..1000).map(sample_message).collect();
    let target = Duration::from_micros(1000);

    let mut group = c.benchmark_group("classifier_latency_assertion");
    group.sample_size(100);
    group.bench_function("classify_per_message", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let capability = classifier.classify(&messages[idx % messages.len()]);
            idx += 1;
            capability
        });
    });
    group.finish();

    let mut times = Vec::with_capacity(messages.len());
    for message in &messages {
        let start = std::time::Instant::now();
        let _capability = classifier.classify(message);
        times.push(start.elapsed());
    }
    times.sort();
    let median = times[499];
    let p95 = times[949];
    let max = *times.last().unwrap();

    eprintln!("\n=== Classifier latency (1000 messages) ===");
    eprintln!("Median:  {:?}", median);
    eprintln!("p95:     {:?} (target: {:?})", p95, target);
    eprintln!("Max:     {:?}", max);

    assert!(
        p95 < target,
        "classifier p95 {:?} exceeds target {:?}",
        p95,
        target
    );
}

criterion_group!(
    benches,
    bench_classify,
    bench_extract,
    bench_classify_latency_assertion
);
criterion_main!(benches);
