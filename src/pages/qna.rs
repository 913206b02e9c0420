//! Authenticated Q&A workspace: ask a question, review and prune history.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted only behind the guard. Requests still go through the gateway, so a
//! token the server rejects mid-session signs the user out from here too.

#[cfg(test)]
#[path = "qna_test.rs"]
mod qna_test;

use leptos::prelude::*;

use crate::app::AppGateway;
use crate::net::types::{AnswerResponse, QuestionRecord, QuestionStats};
use crate::pages::drug_detail::section_label;

const PREVIEW_CHARS: usize = 80;

/// Single-line preview of a stored answer or question.
pub(crate) fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Scalar counters from the stats payload as `(label, value)` rows.
pub(crate) fn stats_rows(stats: &QuestionStats) -> Vec<(String, String)> {
    stats
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((section_label(key), text))
        })
        .collect()
}

/// Drop one record locally after the backend confirmed the delete.
pub(crate) fn without_record(records: &[QuestionRecord], id: &str) -> Vec<QuestionRecord> {
    records.iter().filter(|r| r.id != id).cloned().collect()
}

#[component]
pub fn QnaPage() -> impl IntoView {
    let gateway = expect_context::<AppGateway>();
    let question = RwSignal::new(String::new());
    let answer = RwSignal::new(None::<AnswerResponse>);
    let history = RwSignal::new(Vec::<QuestionRecord>::new());
    let stats = RwSignal::new(Vec::<(String, String)>::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    let refresh = Callback::new({
        let gateway = gateway.clone();
        move |()| {
            #[cfg(feature = "csr")]
            {
                let gateway = gateway.clone();
                leptos::task::spawn_local(async move {
                    match crate::net::api::question_history(&gateway).await {
                        Ok(records) => history.set(records),
                        Err(e) => info.set(e),
                    }
                    if let Ok(counters) = crate::net::api::question_stats(&gateway).await {
                        stats.set(stats_rows(&counters));
                    }
                });
            }
            #[cfg(not(feature = "csr"))]
            {
                let _ = &gateway;
            }
        }
    });
    refresh.run(());

    let on_ask = {
        let gateway = gateway.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if busy.get() {
                return;
            }
            let text = question.get();
            if text.trim().is_empty() {
                info.set("Please enter a question.".to_owned());
                return;
            }
            busy.set(true);
            info.set("Thinking...".to_owned());
            #[cfg(feature = "csr")]
            {
                let gateway = gateway.clone();
                leptos::task::spawn_local(async move {
                    match crate::net::api::ask_question(&gateway, &text).await {
                        Ok(reply) => {
                            answer.set(Some(reply));
                            question.set(String::new());
                            info.set(String::new());
                            refresh.run(());
                        }
                        Err(e) => info.set(e),
                    }
                    busy.set(false);
                });
            }
            #[cfg(not(feature = "csr"))]
            {
                let _ = (&gateway, text);
                busy.set(false);
            }
        }
    };

    let on_delete = Callback::new({
        let gateway = gateway.clone();
        move |id: String| {
            #[cfg(feature = "csr")]
            {
                let gateway = gateway.clone();
                leptos::task::spawn_local(async move {
                    match crate::net::api::delete_history_item(&gateway, &id).await {
                        Ok(()) => history.update(|h| *h = without_record(h, &id)),
                        Err(e) => info.set(e),
                    }
                });
            }
            #[cfg(not(feature = "csr"))]
            {
                let _ = (&gateway, id);
            }
        }
    });

    let on_clear = move |_| {
        #[cfg(feature = "csr")]
        {
            let gateway = gateway.clone();
            leptos::task::spawn_local(async move {
                match crate::net::api::clear_history(&gateway).await {
                    Ok(()) => history.set(Vec::new()),
                    Err(e) => info.set(e),
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = &gateway;
        }
    };

    view! {
        <section class="qna-page">
            <form class="qna-page__ask" on:submit=on_ask>
                <textarea
                    placeholder="Describe your symptoms or ask about a medication"
                    prop:value=move || question.get()
                    on:input=move |ev| question.set(event_target_value(&ev))
                ></textarea>
                <button class="btn" type="submit" disabled=move || busy.get()>"Ask"</button>
            </form>
            <Show when=move || !info.get().is_empty()>
                <p class="qna-page__info">{move || info.get()}</p>
            </Show>
            {move || answer.get().map(|reply| {
                let keywords = reply.identified_keywords.join(", ");
                view! {
                    <article class="qna-page__answer">
                        <p>{reply.answer}</p>
                        {(!keywords.is_empty()).then(|| view! {
                            <p class="qna-page__keywords">"Keywords: " {keywords.clone()}</p>
                        })}
                        {reply.disclaimer.map(|d| view! { <p class="qna-page__disclaimer">{d}</p> })}
                    </article>
                }
            })}
            <aside class="qna-page__stats">
                {move || stats.get().into_iter().map(|(label, value)| view! {
                    <span class="qna-page__stat">{label} ": " {value}</span>
                }).collect_view()}
            </aside>
            <div class="qna-page__history-head">
                <h2>"History"</h2>
                <button class="btn" on:click=on_clear disabled=move || history.get().is_empty()>"Clear all"</button>
            </div>
            <ul class="qna-page__history">
                {move || history.get().into_iter().map(|record| {
                    let id = record.id.clone();
                    view! {
                        <li>
                            <strong>{preview(&record.question)}</strong>
                            <p>{record.answer.as_deref().map(preview).unwrap_or_default()}</p>
                            <button class="btn btn--small" on:click=move |_| on_delete.run(id.clone())>"Delete"</button>
                        </li>
                    }
                }).collect_view()}
            </ul>
        </section>
    }
}
