// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegated table actions.
//!
//! A page owns the data and renders a table child, passing the rows as a JSON
//! attribute. The table listens once on its host, resolves which row button
//! was pressed with `closest`, and reports it upward as a bubbling
//! `table-edit` / `table-delete` event. The page handles the event and
//! re-renders, which replaces the table with a fresh instance.
//!
//! Run:
//! - `cargo run -p sprig_demos --example delegation`

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sprig_dom::escape::escape_text;
use sprig_dom::{AttributeChange, NodeId};
use sprig_runtime::attr::escape_json_for_attribute;
use sprig_runtime::{Component, Cx, EventName, RenderError, Runtime, StateStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Student {
    id: u32,
    name: String,
    grade: String,
}

struct StudentsTable;

impl Component for StudentsTable {
    fn render(&self, state: &StateStore) -> Result<String, RenderError> {
        let rows = state.get::<Vec<Student>>("rows").map_or(&[][..], Vec::as_slice);
        if rows.is_empty() {
            return Ok(r#"<p class="empty">No students</p>"#.into());
        }
        let mut out = String::from("<table><tbody>");
        for s in rows {
            write!(
                out,
                r#"<tr data-id="{}"><td>{}</td><td>{}</td><td><button data-action="edit">Edit</button><button data-action="delete">Delete</button></td></tr>"#,
                s.id,
                escape_text(&s.name),
                escape_text(&s.grade)
            )?;
        }
        out.push_str("</tbody></table>");
        Ok(out)
    }

    fn observed_attributes(&self) -> &'static [&'static str] {
        &["rows"]
    }

    fn attribute_changed(&mut self, cx: &mut Cx<'_>, change: &AttributeChange) {
        if change.name == "rows" {
            let rows: Vec<Student> = cx.json_attribute_or_default("rows");
            cx.set("rows", rows);
        }
    }

    fn connected(&mut self, cx: &mut Cx<'_>) {
        cx.listen(EventName::Click, |cx, event| {
            let Some(button) = cx.delegate(event, "button[data-action]") else {
                return;
            };
            let Some(id) = cx
                .closest(button, "tr[data-id]")
                .and_then(|row| cx.document().attribute(row, "data-id"))
                .and_then(|id| id.parse::<u32>().ok())
            else {
                return;
            };
            let name = match cx.document().attribute(button, "data-action") {
                Some("edit") => EventName::TableEdit,
                Some("delete") => EventName::TableDelete,
                _ => return,
            };
            cx.emit(name, id);
        });
    }
}

struct StudentsPage {
    initial: Vec<Student>,
}

impl Component for StudentsPage {
    fn render(&self, state: &StateStore) -> Result<String, RenderError> {
        let students = state.get::<Vec<Student>>("students").map_or(&[][..], Vec::as_slice);
        let editing = match state.get::<Option<u32>>("editing").copied().flatten() {
            Some(id) => format!("<p>Editing #{id}</p>"),
            None => String::new(),
        };
        Ok(format!(
            r#"<h1>Students ({})</h1>{editing}<demo-students-table rows="{}"></demo-students-table>"#,
            students.len(),
            escape_json_for_attribute(students)?
        ))
    }

    fn created(&mut self, cx: &mut Cx<'_>) {
        cx.set("students", std::mem::take(&mut self.initial));
    }

    fn connected(&mut self, cx: &mut Cx<'_>) {
        cx.listen(EventName::TableDelete, |cx, event| {
            let Some(&id) = event.detail::<u32>() else {
                return;
            };
            info!(id, "delete requested");
            cx.update::<Vec<Student>>("students", |rows| rows.retain(|s| s.id != id));
        });
        cx.listen(EventName::TableEdit, |cx, event| {
            let id = event.detail::<u32>().copied();
            info!(?id, "edit requested");
            cx.set("editing", id);
        });
    }
}

fn row_button(rt: &Runtime, table: NodeId, id: u32, action: &str) -> Option<NodeId> {
    let doc = rt.document();
    let id = id.to_string();
    doc.subtree(table).into_iter().find(|&n| {
        doc.attribute(n, "data-action") == Some(action)
            && doc
                .ancestors(n)
                .any(|a| doc.attribute(a, "data-id") == Some(id.as_str()))
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let students = vec![
        Student {
            id: 1,
            name: "Ada".into(),
            grade: "10".into(),
        },
        Student {
            id: 2,
            name: "Grace <Admin>".into(),
            grade: "11".into(),
        },
        Student {
            id: 3,
            name: "Linus".into(),
            grade: "12".into(),
        },
    ];

    let mut rt = Runtime::new();
    rt.define("demo-students-table", || StudentsTable)?;
    rt.define("demo-students-page", move || StudentsPage {
        initial: students.clone(),
    })?;
    let page = rt.mount_markup(rt.root(), "<demo-students-page></demo-students-page>")?[0];
    println!("{}\n", rt.inner_html(page));

    let table = |rt: &Runtime| rt.document().children(page).last().copied();

    let t = table(&rt).ok_or("table missing")?;
    let edit = row_button(&rt, t, 3, "edit").ok_or("edit button missing")?;
    rt.click(edit)?;

    let t = table(&rt).ok_or("table missing")?;
    let delete = row_button(&rt, t, 2, "delete").ok_or("delete button missing")?;
    rt.click(delete)?;

    println!("{}\n", rt.inner_html(page));
    println!(
        "page renders: {}, page listeners: {}",
        rt.render_count(page).unwrap_or(0),
        rt.listener_count(page)
    );
    Ok(())
}
