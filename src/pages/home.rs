//! Public landing page with a service health probe and drug lookup.

#[cfg(test)]
#[path = "home_test.rs"]
mod home_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::app::AppGateway;
use crate::routing::encode_query_value;

/// Combined result of the two public health probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceStatus {
    Checking,
    Up,
    /// Backend answers but the question service does not.
    Degraded,
    Down,
}

impl ServiceStatus {
    pub fn from_probes(backend_ok: bool, question_service_ok: bool) -> Self {
        match (backend_ok, question_service_ok) {
            (true, true) => Self::Up,
            (true, false) => Self::Degraded,
            (false, _) => Self::Down,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Checking => "Checking services...",
            Self::Up => "All services online",
            Self::Degraded => "Question service unavailable",
            Self::Down => "Backend unreachable",
        }
    }
}

/// Detail route for a drug keyword, or `None` for a blank search.
pub(crate) fn drug_path(keyword: &str) -> Option<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    Some(format!("/drugs/{}", encode_query_value(keyword)))
}

#[component]
pub fn HomePage() -> impl IntoView {
    let gateway = expect_context::<AppGateway>();
    let status = RwSignal::new(ServiceStatus::Checking);
    let keyword = RwSignal::new(String::new());
    let navigate = use_navigate();

    #[cfg(feature = "csr")]
    leptos::task::spawn_local(async move {
        let backend = crate::net::api::spring_health(&gateway).await;
        let questions = crate::net::api::health(&gateway).await;
        if let Err(e) = &backend {
            log::warn!("home: backend health probe failed: {e}");
        }
        status.set(ServiceStatus::from_probes(backend.is_ok(), questions.is_ok()));
    });
    #[cfg(not(feature = "csr"))]
    {
        let _ = gateway;
    }

    let on_search = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if let Some(path) = drug_path(&keyword.get()) {
            navigate(&path, NavigateOptions::default());
        }
    };

    view! {
        <section class="home-page">
            <h1>"Medical Q&A"</h1>
            <p class="home-page__status">{move || status.get().label()}</p>
            <form class="home-page__search" on:submit=on_search>
                <input
                    type="search"
                    placeholder="Look up a drug or condition"
                    prop:value=move || keyword.get()
                    on:input=move |ev| keyword.set(event_target_value(&ev))
                />
                <button class="btn" type="submit">"Search"</button>
            </form>
            <a href="/qna" class="btn home-page__ask">"Ask a question"</a>
        </section>
    }
}
