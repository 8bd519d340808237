//! Benchmark: type-ahead latency vs corpus size.
//!
//! Corpora are generated from a fixed seed so runs are comparable.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use typeahead::{find_best_match, SearchSession};

const QUERIES: &[(&str, &str)] = &[
    ("prefix", "alpha"),
    ("infix", "ngo"),
    ("no_results", "xyzzyplugh"),
];

const CORPUS_SIZES: &[usize] = &[1_000, 10_000, 100_000, 1_000_000];

const SYLLABLES: &[&str] = &[
    "al", "pha", "bra", "vo", "char", "lie", "del", "ta", "ec", "ho", "fox", "trot", "go", "lf",
    "ho", "tel", "in", "di", "a", "ju", "li", "ett", "ki", "lo", "ma", "ngo",
];

/// Human-readable size label: 1_000 → "1k", 1_000_000 → "1M", etc.
fn size_label(n: usize) -> String {
    if n >= 1_000_000 && n % 1_000_000 == 0 {
        format!("{}M", n / 1_000_000)
    } else if n >= 1_000 && n % 1_000 == 0 {
        format!("{}k", n / 1_000)
    } else {
        n.to_string()
    }
}

fn build_corpus(n: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(0x7ea_d0);
    (0..n)
        .map(|_| {
            let words = rng.gen_range(1..4);
            (0..words)
                .map(|_| {
                    let syllables = rng.gen_range(2..5);
                    (0..syllables)
                        .map(|_| SYLLABLES[rng.gen_range(0..SYLLABLES.len())])
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn bench_task_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("task_tree");
    group.sample_size(20);

    for &size in CORPUS_SIZES {
        let corpus = build_corpus(size);
        group.throughput(Throughput::Elements(size as u64));

        for &(name, query) in QUERIES {
            group.bench_with_input(BenchmarkId::new(name, size_label(size)), &corpus, |b, corpus| {
                b.iter(|| find_best_match(&corpus[..], query, size / 2, size / 2 + size))
            });
        }
    }
    group.finish();
}

fn bench_session_keystrokes(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("session");
    group.sample_size(20);

    for &size in CORPUS_SIZES {
        let session = SearchSession::default();
        session.set_strings(build_corpus(size));

        group.bench_function(BenchmarkId::new("type_word", size_label(size)), |b| {
            b.iter(|| {
                rt.block_on(async {
                    session.reset();
                    for key in ["m", "a", "n", "g", "o"] {
                        session.search(key);
                    }
                    session.wait_idle().await;
                    session.current_index()
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_task_tree, bench_session_keystrokes);
criterion_main!(benches);
