use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::seq::SliceRandom;
use rand::Rng;

use ludex::index::btree::BTree;
use ludex::index::inverted::InvertedIndex;
use ludex::index::key::WordKey;
use ludex::index::tree_file::TreeFile;

fn shuffled_keys(count: u32) -> Vec<u32> {
    let mut keys: Vec<u32> = (1..=count).collect();
    keys.shuffle(&mut rand::thread_rng());
    keys
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");
    for count in [1_000u32, 10_000] {
        let keys = shuffled_keys(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter(|| {
                let mut tree = BTree::new(31).unwrap();
                for (row, key) in keys.iter().enumerate() {
                    tree.insert(*key, row as u32).unwrap();
                }
                black_box(tree)
            });
        });
    }
    group.finish();
}

fn bench_tree_find(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let keys = shuffled_keys(10_000);
    let mut tree = BTree::new(31).unwrap();
    for (row, key) in keys.iter().enumerate() {
        tree.insert(*key, row as u32).unwrap();
    }
    let mut file = TreeFile::open(&dir.path().join("bench.btree"), 31).unwrap();
    file.dump(&tree).unwrap();

    let mut rng = rand::thread_rng();
    c.bench_function("tree_find", |b| {
        b.iter(|| {
            let key = rng.gen_range(1..=10_000);
            black_box(file.find(key).unwrap())
        });
    });
}

fn bench_posting_insert(c: &mut Criterion) {
    c.bench_function("posting_insert", |b| {
        let dir = tempfile::tempdir().unwrap();
        let mut index: InvertedIndex<WordKey> = InvertedIndex::open(
            &dir.path().join("bench.posting"),
            &dir.path().join("bench.dictionary"),
            4096,
            8,
            true,
        )
        .unwrap();
        let words = ["meeple", "dice", "worker", "drafting", "engine", "deck"];
        let mut row = 0u32;
        b.iter(|| {
            let word = words[row as usize % words.len()];
            index.insert(&WordKey::new(word), row).unwrap();
            row += 1;
        });
    });
}

criterion_group!(benches, bench_tree_build, bench_tree_find, bench_posting_insert);
criterion_main!(benches);
