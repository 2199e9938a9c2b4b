// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated data loading.
//!
//! A profile card loads whichever user its `user-id` attribute names. Loads
//! are timers on the virtual clock, so a slow first request can answer after a
//! faster second one; the card tags each load and ignores answers that are no
//! longer the latest. Removing the card drops its pending timers.
//!
//! Run:
//! - `cargo run -p sprig_demos --example data_loading`

use std::rc::Rc;
use std::time::Duration;

use sprig_dom::AttributeChange;
use sprig_runtime::{
    Component, Cx, MemorySession, Profile, RenderError, Runtime, StateStore, Token,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct ProfileCard;

impl Component for ProfileCard {
    fn render(&self, state: &StateStore) -> Result<String, RenderError> {
        let status = state.get::<String>("status").map_or("idle", String::as_str);
        Ok(format!("<p>{}</p>", sprig_dom::escape::escape_text(status)))
    }

    fn observed_attributes(&self) -> &'static [&'static str] {
        &["user-id"]
    }

    fn attribute_changed(&mut self, cx: &mut Cx<'_>, change: &AttributeChange) {
        if let Some(user) = &change.new {
            load(cx, user.clone());
        }
    }
}

fn load(cx: &mut Cx<'_>, user: String) {
    let Some(viewer) = cx.session().current_user() else {
        cx.set("status", String::from("signed out"));
        return;
    };
    let Some(tag) = cx.begin_request("profile") else {
        return;
    };
    cx.set("status", format!("loading {user}"));
    info!(viewer = %viewer.name, %user, seq = tag.seq(), "request sent");

    // u1 is the slow one.
    let latency = if user == "u1" { 500 } else { 100 };
    cx.set_timeout(Duration::from_millis(latency), move |cx| {
        if !cx.is_latest(&tag) {
            info!(%user, seq = tag.seq(), "stale response ignored");
            return;
        }
        cx.set("status", format!("loaded {user}"));
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session = Rc::new(MemorySession::new());
    session.sign_in(
        Token::new("demo-token"),
        Profile {
            id: "t1".into(),
            name: "Ms. Rivera".into(),
            role: Some("staff".into()),
        },
    );

    let mut rt = Runtime::new().with_session(session.clone());
    rt.define("demo-profile-card", || ProfileCard)?;
    let card = rt.mount_markup(rt.root(), r#"<demo-profile-card user-id="u1"></demo-profile-card>"#)?[0];
    println!("{:>6?}  {}", rt.now(), rt.inner_html(card));

    rt.set_attribute(card, "user-id", "u2")?;
    println!("{:>6?}  {}", rt.now(), rt.inner_html(card));

    rt.advance_time(Duration::from_millis(200));
    println!("{:>6?}  {}", rt.now(), rt.inner_html(card));

    // The slow u1 answer arrives now and changes nothing.
    rt.advance_time(Duration::from_millis(400));
    println!("{:>6?}  {}", rt.now(), rt.inner_html(card));

    session.sign_out();
    rt.set_attribute(card, "user-id", "u3")?;
    println!("{:>6?}  {}", rt.now(), rt.inner_html(card));

    session.sign_in(
        Token::new("demo-token-2"),
        Profile {
            id: "t1".into(),
            name: "Ms. Rivera".into(),
            role: None,
        },
    );
    rt.set_attribute(card, "user-id", "u4")?;
    let renders = rt.render_count(card).unwrap_or(0);
    rt.remove(card)?;
    rt.advance_time(Duration::from_secs(1));
    println!("removed with a load in flight; renders stayed at {renders}");
    Ok(())
}
