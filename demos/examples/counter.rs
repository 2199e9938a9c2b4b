// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter.
//!
//! One component, one host-level click listener, and delegation to the
//! buttons that every render recreates. Set `RUST_LOG=sprig_runtime=trace` to
//! watch writes coalesce into one render per checkpoint.
//!
//! Run:
//! - `cargo run -p sprig_demos --example counter`

use sprig_runtime::{Component, Cx, EventName, RenderError, Runtime, StateKey, StateStore};
use tracing_subscriber::EnvFilter;

const COUNT: StateKey<i64> = StateKey::new("count");
const STEP: StateKey<i64> = StateKey::new("step");

struct Counter;

impl Component for Counter {
    fn render(&self, state: &StateStore) -> Result<String, RenderError> {
        let count = state.read(COUNT).copied().unwrap_or(0);
        let step = state.read(STEP).copied().unwrap_or(1);
        Ok(format!(
            r#"<output>{count}</output><button data-action="dec">-{step}</button><button data-action="inc">+{step}</button>"#
        ))
    }

    fn created(&mut self, cx: &mut Cx<'_>) {
        cx.put(STEP, 1);
    }

    fn connected(&mut self, cx: &mut Cx<'_>) {
        cx.listen(EventName::Click, |cx, event| {
            let Some(button) = cx.delegate(event, "button[data-action]") else {
                return;
            };
            let step = cx.read(STEP).copied().unwrap_or(1);
            let delta = match cx.document().attribute(button, "data-action") {
                Some("inc") => step,
                Some("dec") => -step,
                _ => return,
            };
            // Two writes, one render.
            cx.update::<i64>(COUNT.name(), |n| *n += delta);
            cx.put(STEP, step * 2);
        });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rt = Runtime::new();
    rt.define("demo-counter", || Counter)?;
    let host = rt.mount_markup(rt.root(), "<demo-counter></demo-counter>")?[0];
    println!("initial: {}", rt.inner_html(host));

    for action in ["inc", "inc", "dec", "inc"] {
        let button = rt
            .document()
            .children(host)
            .iter()
            .copied()
            .find(|&n| rt.document().attribute(n, "data-action") == Some(action))
            .ok_or("button missing")?;
        rt.click(button)?;
        println!("after {action}: {}", rt.inner_html(host));
    }

    println!(
        "renders: {}, listeners on host: {}",
        rt.render_count(host).unwrap_or(0),
        rt.listener_count(host)
    );
    Ok(())
}
