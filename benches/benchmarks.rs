use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sicp_streams::combinators::{filter, map, zip};
use sicp_streams::combinatorics::permutations;
use sicp_streams::generators::{accumulate, count, cycle};
use sicp_streams::recipes::{convolve, take};
use sicp_streams::stream::{from_iterator, from_values, nth, stream_eq, to_vec};

// ============================================================================
// Construction Benchmarks
// ============================================================================

fn bench_from_values(c: &mut Criterion) {
    c.bench_function("from_values (1000 elements)", |b| {
        b.iter(|| black_box(from_values((0..1000i64).collect())))
    });
}

fn bench_from_iterator_forced(c: &mut Criterion) {
    c.bench_function("from_iterator forced (1000 elements)", |b| {
        b.iter(|| {
            let s = from_iterator(0..1000i64);
            black_box(to_vec(&s).unwrap())
        })
    });
}

// ============================================================================
// Forcing Benchmarks
// ============================================================================

fn bench_nth_deep(c: &mut Criterion) {
    c.bench_function("nth 999 of lazy count", |b| {
        b.iter(|| black_box(nth(&count(0i64, 1), 999).unwrap()))
    });
}

fn bench_memoized_retraversal(c: &mut Criterion) {
    // First traversal pays for the thunks; later ones walk resolved cells.
    let s = from_iterator(0..1000i64);
    to_vec(&s).unwrap();
    c.bench_function("retraverse resolved stream (1000 elements)", |b| {
        b.iter(|| black_box(to_vec(&s).unwrap()))
    });
}

// ============================================================================
// Combinator Benchmarks
// ============================================================================

fn bench_map_filter_pipeline(c: &mut Criterion) {
    c.bench_function("map+filter pipeline (1000 elements)", |b| {
        b.iter(|| {
            let squares = map(|n: &i64| n * n, &count(0i64, 1));
            let odd = filter(|n: &i64| n % 2 == 1, &squares).unwrap();
            black_box(take(1000, &odd).unwrap())
        })
    });
}

fn bench_zip(c: &mut Criterion) {
    let a = from_values((0..1000i64).collect());
    let b_stream = from_values((1000..2000i64).collect());
    c.bench_function("zip two resolved streams (1000 elements)", |b| {
        b.iter(|| black_box(to_vec(&zip(&a, &b_stream)).unwrap()))
    });
}

fn bench_accumulate(c: &mut Criterion) {
    c.bench_function("accumulate running sum (1000 elements)", |b| {
        b.iter(|| {
            let sums = accumulate(&count(1i64, 1), |x, y| x + y, None);
            black_box(nth(&sums, 999).unwrap())
        })
    });
}

fn bench_cycle(c: &mut Criterion) {
    let base = from_values((0..10i64).collect());
    c.bench_function("cycle, 1000 elements demanded", |b| {
        b.iter(|| black_box(take(1000, &cycle(&base)).unwrap()))
    });
}

// ============================================================================
// Equality Benchmarks
// ============================================================================

fn bench_stream_eq(c: &mut Criterion) {
    let a = from_values((0..256i64).collect());
    let b_stream = from_values((0..256i64).collect());
    c.bench_function("stream_eq at the depth limit", |b| {
        b.iter(|| black_box(stream_eq(&a, &b_stream).unwrap()))
    });
}

// ============================================================================
// Combinatorial Benchmarks
// ============================================================================

fn bench_permutations(c: &mut Criterion) {
    let pool = from_values((0..6i64).collect());
    c.bench_function("permutations of 6, fully enumerated", |b| {
        b.iter(|| {
            let perms = permutations(&pool, None).unwrap();
            black_box(to_vec(&perms).unwrap().len())
        })
    });
}

fn bench_convolve(c: &mut Criterion) {
    let signal = from_values((0..256).map(|n| n as f64).collect());
    let kernel: Vec<f64> = vec![0.25; 16];
    c.bench_function("convolve 256-sample signal, 16-tap kernel", |b| {
        b.iter(|| {
            let out = convolve(&signal, &kernel).unwrap();
            black_box(to_vec(&out).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_from_values,
    bench_from_iterator_forced,
    bench_nth_deep,
    bench_memoized_retraversal,
    bench_map_filter_pipeline,
    bench_zip,
    bench_accumulate,
    bench_cycle,
    bench_stream_eq,
    bench_permutations,
    bench_convolve,
);
criterion_main!(benches);
