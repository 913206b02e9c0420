//! Shown when a signed-in user opens a route their role does not grant.

use leptos::prelude::*;

#[component]
pub fn ForbiddenPage() -> impl IntoView {
    view! {
        <section class="status-page">
            <h1>"403"</h1>
            <p>"You do not have permission to view this page."</p>
            <a href="/" class="btn">"Back to home"</a>
        </section>
    }
}
