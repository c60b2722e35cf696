// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_tree::{ItemGraph, LabelPolicy, SourceId, TreeData, TreeItemSpec, TreeKey};

/// A complete tree: `fanout` children per item, `depth` levels below the roots.
fn gen_tree(roots: usize, fanout: usize, depth: usize, expanded: bool) -> (ItemGraph, Vec<SourceId>) {
    fn grow(graph: &mut ItemGraph, parent: SourceId, fanout: usize, depth: usize, expanded: bool) {
        if depth == 0 {
            return;
        }
        for i in 0..fanout {
            let child = graph.insert_child(parent, TreeItemSpec::new(&format!("item {i}")).expanded(expanded));
            grow(graph, child, fanout, depth - 1, expanded);
        }
    }

    let mut graph = ItemGraph::new();
    let mut ids = Vec::with_capacity(roots);
    for r in 0..roots {
        let root = graph.insert(TreeItemSpec::new(&format!("root {r}")).expanded(expanded));
        grow(&mut graph, root, fanout, depth, expanded);
        ids.push(root);
    }
    (graph, ids)
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_parse");
    for &(fanout, depth) in &[(4usize, 4usize), (8, 4), (10, 5)] {
        for expanded in [false, true] {
            let (graph, roots) = gen_tree(4, fanout, depth, expanded);
            group.throughput(Throughput::Elements(graph.len() as u64));
            let name = format!(
                "parse_f{fanout}_d{depth}_{}",
                if expanded { "expanded" } else { "collapsed" }
            );
            group.bench_function(name, |b| {
                b.iter_batched(
                    TreeData::new,
                    |mut data| {
                        let root = data.parse(&graph, &roots, LabelPolicy::Skip);
                        black_box((root.is_ok(), data.visible_items().count()));
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_visibility");
    let (graph, roots) = gen_tree(4, 8, 4, true);
    let mut parsed = TreeData::new();
    let _ = parsed.parse(&graph, &roots, LabelPolicy::Skip);
    group.bench_function("collapse_reveal_roots", |b| {
        b.iter_batched(
            || parsed.clone(),
            |mut data| {
                for r in 1..=roots.len() {
                    let key = TreeKey::new(&r.to_string());
                    data.update_visible_on_collapse(&key);
                    data.reveal_children(&graph, &key);
                }
                black_box(data.visible_items().count());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_collapse);
criterion_main!(benches);
