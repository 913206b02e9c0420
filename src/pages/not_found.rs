//! Router fallback for paths outside the route table.

use leptos::prelude::*;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <section class="status-page">
            <h1>"404"</h1>
            <p>"Page not found."</p>
            <a href="/" class="btn">"Back to home"</a>
        </section>
    }
}
