//! Performance benchmarks for collation.
//!
//! Run with: `cargo bench --bench collation`
//!
//! Match discovery is O(N² · V²) over N witnesses of V vertices and the
//! selection search is combinatorial in the conflict structure, so these
//! benchmarks track how cost scales with witness length and with repeated
//! vocabulary (the worst case for the selector).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use collation_kernel::{
    find_potential_matches, Collator, Sigil, Token, VariantWitnessGraph,
};

/// Build a linear witness over a cyclic vocabulary.
fn make_witness(sigil: &str, words: usize, vocabulary: usize) -> VariantWitnessGraph {
    let sigil = Sigil::from(sigil);
    let mut g = VariantWitnessGraph::new(sigil.clone());
    let mut prev = g.start();
    for i in 0..words {
        let raw = format!("w{} ", i % vocabulary);
        let v = g.add_token_vertex(
            Token::new(sigil.clone(), raw, i as u32, vec!["xml".to_string()]),
            vec![0],
        );
        g.add_edge(prev, v);
        prev = v;
    }
    g.add_edge(prev, g.end());
    g
}

fn bench_match_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_discovery");
    for words in [10, 40, 80] {
        let witnesses = vec![
            make_witness("A", words, words),
            make_witness("B", words, words),
        ];
        group.throughput(Throughput::Elements(words as u64));
        group.bench_with_input(BenchmarkId::new("words", words), &witnesses, |b, w| {
            b.iter(|| find_potential_matches(black_box(w)).unwrap())
        });
    }
    group.finish();
}

fn bench_collation_distinct_vocabulary(c: &mut Criterion) {
    let mut group = c.benchmark_group("collate_distinct");
    for words in [10, 40, 80] {
        let witnesses = vec![
            make_witness("A", words, words),
            make_witness("B", words, words),
        ];
        group.throughput(Throughput::Elements(words as u64));
        group.bench_with_input(BenchmarkId::new("words", words), &witnesses, |b, w| {
            b.iter(|| Collator::default().collate(black_box(w)).unwrap())
        });
    }
    group.finish();
}

fn bench_collation_repetitive_vocabulary(c: &mut Criterion) {
    // Small vocabulary means many candidate matches per token, which is
    // what drives the selection search.
    let mut group = c.benchmark_group("collate_repetitive");
    for words in [6, 9] {
        let witnesses = vec![
            make_witness("A", words, 3),
            make_witness("B", words, 3),
        ];
        group.throughput(Throughput::Elements(words as u64));
        group.bench_with_input(BenchmarkId::new("words", words), &witnesses, |b, w| {
            b.iter(|| Collator::default().collate(black_box(w)).unwrap())
        });
    }
    group.finish();
}

fn bench_three_witnesses(c: &mut Criterion) {
    let mut group = c.benchmark_group("collate_three_witnesses");
    for words in [10, 30] {
        let witnesses = vec![
            make_witness("A", words, words),
            make_witness("B", words, words),
            make_witness("C", words, words),
        ];
        group.throughput(Throughput::Elements(words as u64));
        group.bench_with_input(BenchmarkId::new("words", words), &witnesses, |b, w| {
            b.iter(|| Collator::default().collate(black_box(w)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_match_discovery,
    bench_collation_distinct_vocabulary,
    bench_collation_repetitive_vocabulary,
    bench_three_witnesses
);
criterion_main!(benches);
