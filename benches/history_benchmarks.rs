//! Benchmarks for dispatch and grouped undo.
//!
//! Run with: cargo bench

use chordal_buffer::{TextBuffer, TextRange};
use chordal_core::{Command, CommandReader, Config, Document, History, Shortcut, modify};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::time::{Duration, Instant};

const DELTA: Duration = Duration::from_secs(2);

/// Generates a large text string for benchmarking.
fn generate_large_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Line {}: This is a sample line of text for benchmarking purposes.\n", i))
        .collect()
}

/// Types `count` characters at the end of `buffer`, `gap` apart.
fn type_into(history: &mut History, buffer: &mut TextBuffer, count: usize, gap: Duration) {
    let mut now = Instant::now();
    for i in 0..count {
        let at = buffer.len_chars();
        let c = char::from(b'a' + (i % 26) as u8);
        let edit = modify(&*buffer, &[TextRange::cursor(at)], c).unwrap();
        history.push(Command::edit("insert", edit, now), buffer).unwrap();
        now += gap;
    }
}

/// Benchmarks recording edits through history.
fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_push");
    let base_text = generate_large_text(1000);

    for count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("typing", count), count, |b, &count| {
            b.iter_with_setup(
                || (History::new(0), TextBuffer::from(base_text.as_str())),
                |(mut history, mut buffer)| {
                    type_into(&mut history, &mut buffer, count, Duration::from_millis(50));
                    black_box(history.undo_count())
                },
            )
        });
    }

    group.finish();
}

/// Benchmarks undoing one large group versus many small ones.
fn bench_undo(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_undo");

    for (name, gap) in [("one_group", Duration::from_millis(10)), ("many_groups", DELTA * 2)] {
        group.bench_function(name, |b| {
            b.iter_with_setup(
                || {
                    let mut history = History::new(0);
                    let mut buffer = TextBuffer::new();
                    type_into(&mut history, &mut buffer, 500, gap);
                    (history, buffer)
                },
                |(mut history, mut buffer)| {
                    while history.undo_next_group(DELTA, &mut buffer).is_ok() {}
                    black_box(buffer)
                },
            )
        });
    }

    group.finish();
}

/// Benchmarks full dispatch through the reader.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    group.bench_function("self_insert", |b| {
        b.iter_with_setup(
            || {
                let (mut reader, _input) = CommandReader::new(&Config::default()).unwrap();
                reader.bind_document(Document::untitled()).unwrap();
                reader
            },
            |mut reader| {
                let now = Instant::now();
                for _ in 0..100 {
                    reader.dispatch_at(black_box(Shortcut::char('x')), now).unwrap();
                }
                black_box(reader)
            },
        )
    });

    group.bench_function("chord", |b| {
        b.iter_with_setup(
            || {
                let (mut reader, _input) = CommandReader::new(&Config::default()).unwrap();
                reader.bind_document(Document::untitled()).unwrap();
                reader
            },
            |mut reader| {
                let now = Instant::now();
                for _ in 0..100 {
                    reader.dispatch_at(Shortcut::ctrl('x'), now).unwrap();
                    let _ = reader.dispatch_at(Shortcut::char('r'), now);
                }
                black_box(reader)
            },
        )
    });

    group.finish();
}

criterion_group!(benches, bench_push, bench_undo, bench_dispatch);
criterion_main!(benches);
