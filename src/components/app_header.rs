//! Top bar with navigation, the signed-in user, token time left, and logout.

use leptos::prelude::*;

use crate::app::AppGateway;
use crate::net::types::Role;
use crate::state::auth::AuthState;
use crate::state::session::SessionManager;
use crate::util::clock;

/// Application header rendered above every route.
#[component]
pub fn AppHeader() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionManager>();
    let gateway = expect_context::<AppGateway>();
    let now = RwSignal::new(clock::now_unix_secs());

    #[cfg(feature = "csr")]
    {
        let alive = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let alive_task = alive.clone();
        let ticker_session = session.clone();
        leptos::task::spawn_local(async move {
            loop {
                gloo_timers::future::sleep(std::time::Duration::from_secs(30)).await;
                if !alive_task.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                now.set(clock::now_unix_secs());
                ticker_session.expire_if_stale();
            }
        });
        on_cleanup(move || alive.store(false, std::sync::atomic::Ordering::Relaxed));
    }

    let signed_in = move || auth.get().is_authenticated_at(now.get());
    let identity = move || {
        let state = auth.get();
        let name = state.username().unwrap_or_default().to_owned();
        let role = state.role().map(Role::as_str).unwrap_or_default();
        format!("{name} ({role})")
    };
    let remaining = move || auth.get().remaining_label(now.get()).unwrap_or_default();

    let busy = RwSignal::new(false);
    let on_logout = Callback::new(move |()| {
        if busy.get() {
            return;
        }
        busy.set(true);
        #[cfg(feature = "csr")]
        {
            let session = session.clone();
            let gateway = gateway.clone();
            leptos::task::spawn_local(async move {
                session.logout(&gateway).await;
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&session, &gateway);
            busy.set(false);
        }
    });

    view! {
        <header class="app-header">
            <a href="/" class="app-header__brand">"Medical Q&A"</a>
            <nav class="app-header__nav">
                <a href="/">"Home"</a>
                <a href="/qna">"Ask"</a>
                <Show when=move || auth.get().is_admin()>
                    <a href="/admin">"Admin"</a>
                </Show>
            </nav>
            <span class="app-header__spacer"></span>
            <Show
                when=signed_in
                fallback=|| view! { <a href="/auth" class="btn app-header__login">"Sign in"</a> }
            >
                <span class="app-header__user">{identity}</span>
                <span class="app-header__remaining" title="Session time left">{remaining}</span>
                <button class="btn app-header__logout" on:click=move |_| on_logout.run(()) disabled=move || busy.get()>
                    "Logout"
                </button>
            </Show>
        </header>
    }
}
