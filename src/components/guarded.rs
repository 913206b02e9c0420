//! Route wrapper that mounts its children only when the guard allows it.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every routed view is wrapped in `Guarded`, so a protected page is never
//! rendered for a session that may not see it, not even for one frame.

#[cfg(test)]
#[path = "guarded_test.rs"]
mod guarded_test;

use leptos::prelude::*;
use leptos_meta::Title;
use leptos_router::components::Redirect;
use leptos_router::hooks::use_location;

use crate::routing::{GuardDecision, decide, resolve};
use crate::state::auth::AuthState;
use crate::util::clock;

const DEFAULT_TITLE: &str = "Medical Q&A";

/// Render `children` if the current location is allowed, else redirect.
#[component]
pub fn Guarded(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let location = use_location();

    move || {
        let requested = requested_path(&location.pathname.get(), &location.search.get());
        match decide(&requested, &auth.get(), clock::now_unix_secs()) {
            GuardDecision::Allow => {
                let title = resolve(&requested).map_or(DEFAULT_TITLE, |route| route.title);
                view! {
                    <Title text=title/>
                    {children()}
                }
                .into_any()
            }
            GuardDecision::Redirect(target) => view! { <Redirect path=target/> }.into_any(),
        }
    }
}

/// Path plus query string, as preserved in the login redirect.
pub(crate) fn requested_path(pathname: &str, search: &str) -> String {
    let search = search.strip_prefix('?').unwrap_or(search);
    if search.is_empty() { pathname.to_owned() } else { format!("{pathname}?{search}") }
}
