// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};
use tessera_grid::columns::normalize_columns;
use tessera_grid::rows::{set_data_value, set_key_field, update_rows_and_cell_indexes};
use tessera_grid::selector::{handle_select_row, mark_all_rows_deselected, mark_all_rows_selected, set_max_row_selection};
use tessera_grid::{ColumnDefinition, GridState, TypeRegistry};

fn gen_columns() -> Vec<ColumnDefinition> {
    serde_json::from_value(json!([
        { "label": "Name", "fieldName": "name", "editable": true },
        { "label": "Email", "fieldName": "email", "type": "email" },
        { "label": "Balance", "fieldName": "balance", "type": "currency",
          "typeAttributes": { "currencyCode": "EUR" } },
        { "label": "Opened", "fieldName": "opened", "type": "date" },
        { "label": "Site", "fieldName": "site", "type": "url",
          "typeAttributes": { "label": { "fieldName": "name" } } },
        { "type": "action", "typeAttributes": { "rowActions": [] } },
    ]))
    .unwrap_or_default()
}

fn gen_rows(n: usize) -> Value {
    let rows = (0..n)
        .map(|i| {
            json!({
                "id": format!("row-{i}"),
                "name": format!("Account {i}"),
                "email": format!("a{i}@example.com"),
                "balance": i * 7 % 1000,
                "opened": "2024-05-01",
                "site": format!("https://example.com/{i}"),
            })
        })
        .collect();
    Value::Array(rows)
}

fn gen_state(n: usize, registry: &TypeRegistry) -> GridState {
    let mut state = GridState::default();
    let _ = set_key_field(&mut state, &json!("id"));
    state.user_columns = gen_columns();
    normalize_columns(&mut state, registry);
    set_data_value(&mut state, &gen_rows(n));
    let _ = update_rows_and_cell_indexes(&mut state, registry);
    state
}

fn bench_rebuild(c: &mut Criterion) {
    let registry = TypeRegistry::new();
    let mut group = c.benchmark_group("rows_rebuild");
    for &n in &[100usize, 1_000, 10_000] {
        let state = gen_state(n, &registry);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("full_rebuild_n{n}"), |b| {
            b.iter_batched(
                || state.clone(),
                |mut state| {
                    let _ = update_rows_and_cell_indexes(&mut state, &registry);
                    black_box(state.indexes.len());
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let registry = TypeRegistry::new();
    let mut group = c.benchmark_group("selection");
    let n = 5_000;
    let state = gen_state(n, &registry);
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("select_all_deselect_all", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                mark_all_rows_selected(&mut state);
                mark_all_rows_deselected(&mut state);
                black_box(state.selection.selected_rows_keys.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("shift_ranges_capped", |b| {
        b.iter_batched(
            || {
                let mut state = state.clone();
                set_max_row_selection(&mut state, &json!(250));
                state
            },
            |mut state| {
                for start in (0..n).step_by(500) {
                    handle_select_row(&mut state, &format!("row-{start}"), false);
                    handle_select_row(&mut state, &format!("row-{}", start + 100), true);
                }
                black_box(state.selection.selected_rows_keys.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_selection);
criterion_main!(benches);
