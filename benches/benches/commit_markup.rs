// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt::Write as _;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sprig_dom::{Document, NodeId};
use sprig_runtime::{Component, Cx, EventName, RenderError, Runtime, StateStore};

fn gen_rows(n: usize, salt: usize) -> String {
    let mut out = String::from("<table><tbody>");
    for i in 0..n {
        let _ = write!(
            out,
            r#"<tr data-id="{i}"><td class="name">row {}</td><td><button data-action="edit">Edit</button></td></tr>"#,
            i + salt
        );
    }
    out.push_str("</tbody></table>");
    out
}

struct Table;

impl Component for Table {
    fn render(&self, state: &StateStore) -> Result<String, RenderError> {
        let rows = state.get::<usize>("rows").copied().unwrap_or(0);
        let salt = state.get::<usize>("salt").copied().unwrap_or(0);
        Ok(gen_rows(rows, salt))
    }

    fn connected(&mut self, cx: &mut Cx<'_>) {
        cx.listen(EventName::Click, |cx, event| {
            if let Some(button) = cx.delegate(event, "button[data-action]") {
                black_box(cx.closest(button, "tr[data-id]"));
            }
        });
    }
}

fn mounted_table(rows: usize) -> (Runtime, NodeId) {
    let mut rt = Runtime::new();
    let _ = rt.define("bench-table", || Table);
    let host = rt
        .mount_markup(rt.root(), "<bench-table></bench-table>")
        .ok()
        .and_then(|nodes| nodes.first().copied())
        .unwrap_or_else(|| rt.root());
    rt.update(host, |cx| cx.set("rows", rows));
    (rt, host)
}

fn last_button(rt: &Runtime, host: NodeId) -> NodeId {
    let doc = rt.document();
    doc.subtree(host)
        .into_iter()
        .rev()
        .find(|&n| doc.tag(n) == Some("button"))
        .unwrap_or(host)
}

fn bench_markup(c: &mut Criterion) {
    let mut group = c.benchmark_group("markup");
    for &n in &[16usize, 128, 1024] {
        let markup = gen_rows(n, 0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("set_inner_html_rows{}", n), |b| {
            b.iter_batched(
                || {
                    let mut doc = Document::new();
                    let host = doc.create_element("div");
                    let root = doc.root();
                    let _ = doc.append_child(root, host);
                    (doc, host)
                },
                |(mut doc, host)| {
                    let change = doc.set_inner_html(host, &markup);
                    black_box(change.map(|c| c.inserted.len()).unwrap_or(0));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");
    for &n in &[16usize, 128, 1024] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("rerender_rows{}", n), |b| {
            b.iter_batched(
                || mounted_table(n),
                |(mut rt, host)| {
                    rt.update(host, |cx| cx.set("salt", 1_usize));
                    black_box(rt.render_count(host));
                },
                BatchSize::SmallInput,
            )
        });
    }
    // Many writes in one turn still cost one render.
    group.bench_function("coalesced_writes_rows128", |b| {
        b.iter_batched(
            || mounted_table(128),
            |(mut rt, host)| {
                rt.update(host, |cx| {
                    for salt in 0..256_usize {
                        cx.set("salt", salt);
                    }
                });
                black_box(rt.render_count(host));
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for &n in &[16usize, 1024] {
        group.bench_function(format!("delegated_click_rows{}", n), |b| {
            b.iter_batched(
                || {
                    let (rt, host) = mounted_table(n);
                    let button = last_button(&rt, host);
                    (rt, button)
                },
                |(mut rt, button)| {
                    black_box(rt.click(button).ok());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_markup, bench_commit, bench_dispatch);
criterion_main!(benches);
