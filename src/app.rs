//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Builds the single `SessionManager` and the gateway wired to it, restores
//! any persisted session, then provides both plus the `AuthState` signal to
//! every page. Each route view is wrapped in `Guarded`.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::provide_meta_context;
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::app_header::AppHeader;
use crate::components::guarded::Guarded;
use crate::config::ApiConfig;
use crate::net::gateway::{Gateway, UnauthorizedHook};
use crate::net::transport::BrowserTransport;
use crate::pages::{
    admin::AdminPage, auth::AuthPage, drug_detail::DrugDetailPage, forbidden::ForbiddenPage, home::HomePage,
    not_found::NotFoundPage, qna::QnaPage,
};
use crate::state::auth::AuthState;
use crate::state::session::{Navigator, Session, SessionManager};
use crate::util::storage::{KeyValueStore, TokenStore};

/// Gateway type provided through context.
pub type AppGateway = Gateway<BrowserTransport>;

#[cfg(feature = "csr")]
fn storage_backend() -> Arc<dyn KeyValueStore> {
    Arc::new(crate::util::storage::BrowserStorage)
}

#[cfg(not(feature = "csr"))]
fn storage_backend() -> Arc<dyn KeyValueStore> {
    Arc::new(crate::util::storage::MemoryStorage::new())
}

/// Full-page navigation. Skipped when already on `path` so an expiry while
/// on `/auth` does not reload the page and drop its redirect target.
fn browser_navigator() -> Navigator {
    Arc::new(|path: &str| {
        #[cfg(feature = "csr")]
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let location = window.location();
            if location.pathname().ok().as_deref() == Some(path) {
                return;
            }
            if let Err(e) = location.set_href(path) {
                log::error!("navigate to {path} failed: {e:?}");
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            log::debug!("navigate: {path}");
        }
    })
}

/// Session manager plus a gateway whose 401 hook expires that session.
pub fn build_services(config: ApiConfig) -> (SessionManager, AppGateway) {
    let store = TokenStore::new(storage_backend(), config.storage_keys.clone());
    let session = SessionManager::new(store, browser_navigator());

    let hook_session = session.clone();
    let on_unauthorized: UnauthorizedHook = Arc::new(move |token: &str| {
        hook_session.expire(token);
    });
    let gateway = Gateway::new(BrowserTransport, config)
        .with_credentials(Arc::new(session.clone()))
        .with_unauthorized_hook(on_unauthorized);
    (session, gateway)
}

/// Root application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let (session, gateway) = build_services(ApiConfig::from_build_env());

    let auth = RwSignal::new(AuthState::default());
    session.subscribe(Arc::new(move |s: &Session| auth.set(AuthState::from_session(s))));
    session.initialize();

    #[cfg(feature = "csr")]
    {
        if session.current().is_authenticated() {
            let session = session.clone();
            let gateway = gateway.clone();
            leptos::task::spawn_local(async move { session.revalidate(&gateway).await });
        }
    }

    provide_context(auth);
    provide_context(session);
    provide_context(gateway);

    view! {

        <Router>
            <AppHeader/>
            <main class="app-main">
                <Routes fallback=|| view! { <NotFoundPage/> }>
                    <Route path=StaticSegment("") view=|| view! { <Guarded><HomePage/></Guarded> }/>
                    <Route path=StaticSegment("home") view=|| view! { <Guarded><HomePage/></Guarded> }/>
                    <Route
                        path=(StaticSegment("drugs"), ParamSegment("id"))
                        view=|| view! { <Guarded><DrugDetailPage/></Guarded> }
                    />
                    <Route path=StaticSegment("qna") view=|| view! { <Guarded><QnaPage/></Guarded> }/>
                    <Route path=StaticSegment("auth") view=|| view! { <Guarded><AuthPage/></Guarded> }/>
                    <Route path=StaticSegment("admin") view=|| view! { <Guarded><AdminPage/></Guarded> }/>
                    <Route path=StaticSegment("forbidden") view=|| view! { <Guarded><ForbiddenPage/></Guarded> }/>
                </Routes>
            </main>
        </Router>
    }
}
