//! Public drug/condition detail page backed by the knowledge-graph lookup.

#[cfg(test)]
#[path = "drug_detail_test.rs"]
mod drug_detail_test;

use leptos::prelude::*;
use leptos_router::hooks::use_params_map;
use serde_json::Value;

use crate::app::AppGateway;
use crate::net::types::KnowledgeEntry;
use crate::routing::decode_query_value;

#[derive(Clone, Debug, PartialEq)]
enum Lookup {
    Loading,
    Found(Vec<(String, String)>),
    Failed(String),
}

/// Turn a camelCase field name into a sentence-case label.
pub(crate) fn section_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.extend(ch.to_lowercase());
        } else if ch == '_' {
            label.push(' ');
        } else {
            label.push(ch);
        }
    }
    label
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(render_value).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Displayable `(label, text)` rows; `name` is shown as the title instead.
pub(crate) fn knowledge_sections(entry: &KnowledgeEntry) -> Vec<(String, String)> {
    entry
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .filter_map(|(key, value)| render_value(value).map(|text| (section_label(key), text)))
        .collect()
}

#[component]
pub fn DrugDetailPage() -> impl IntoView {
    let gateway = expect_context::<AppGateway>();
    let params = use_params_map();
    let keyword = move || {
        let raw = params.read().get("id").unwrap_or_default();
        decode_query_value(&raw).unwrap_or(raw)
    };
    let lookup = RwSignal::new(Lookup::Loading);

    Effect::new(move || {
        let keyword = keyword();
        lookup.set(Lookup::Loading);
        #[cfg(feature = "csr")]
        {
            let gateway = gateway.clone();
            leptos::task::spawn_local(async move {
                match crate::net::api::query_knowledge(&gateway, &keyword).await {
                    Ok(entry) => lookup.set(Lookup::Found(knowledge_sections(&entry))),
                    Err(e) => lookup.set(Lookup::Failed(e)),
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&gateway, keyword);
        }
    });

    view! {
        <section class="drug-page">
            <a href="/" class="drug-page__back">"← Back"</a>
            <h1>{keyword}</h1>
            {move || match lookup.get() {
                Lookup::Loading => view! { <p class="drug-page__info">"Loading..."</p> }.into_any(),
                Lookup::Failed(message) => view! { <p class="drug-page__error">{message}</p> }.into_any(),
                Lookup::Found(rows) if rows.is_empty() => {
                    view! { <p class="drug-page__info">"No details recorded."</p> }.into_any()
                }
                Lookup::Found(rows) => view! {
                    <dl class="drug-page__facts">
                        {rows
                            .into_iter()
                            .map(|(label, text)| view! { <dt>{label}</dt><dd>{text}</dd> })
                            .collect_view()}
                    </dl>
                }
                .into_any(),
            }}
        </section>
    }
}
