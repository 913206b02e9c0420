//! Sign-in and registration page.
//!
//! SYSTEM CONTEXT
//! ==============
//! The guard sends unauthenticated visitors here with `?redirect=<path>`.
//! After a successful login the page navigates back to that path once it has
//! been sanitized by `routing::post_login_target`.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::app::AppGateway;
use crate::net::types::{LoginRequest, RegisterRequest};
use crate::routing::post_login_target;
use crate::state::auth::AuthState;
use crate::state::session::SessionManager;
use crate::util::clock;

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Login,
    Register,
}

pub(crate) fn validate_login(username: &str, password: &str) -> Result<LoginRequest, &'static str> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err("Enter both username and password.");
    }
    Ok(LoginRequest { username: username.to_owned(), password: password.to_owned() })
}

pub(crate) fn validate_register(
    username: &str,
    password: &str,
    confirm: &str,
    email: &str,
) -> Result<RegisterRequest, &'static str> {
    let username = username.trim();
    let email = email.trim();
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err("Username must be at least 3 characters.");
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err("Password must be at least 6 characters.");
    }
    if password != confirm {
        return Err("Passwords do not match.");
    }
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid_email {
        return Err("Enter a valid email address.");
    }
    Ok(RegisterRequest { username: username.to_owned(), password: password.to_owned(), email: email.to_owned() })
}

#[component]
pub fn AuthPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionManager>();
    let gateway = expect_context::<AppGateway>();
    let location = use_location();
    let navigate = use_navigate();

    let mode = RwSignal::new(Mode::Login);
    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    // Already signed in: go straight to the preserved target.
    Effect::new(move || {
        if auth.get().is_authenticated_at(clock::now_unix_secs()) {
            let target = post_login_target(&location.search.get_untracked());
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    let on_login = {
        let gateway = gateway.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if busy.get() {
                return;
            }
            let request = match validate_login(&username.get(), &password.get()) {
                Ok(request) => request,
                Err(message) => {
                    info.set(message.to_owned());
                    return;
                }
            };
            busy.set(true);
            info.set("Signing in...".to_owned());

            #[cfg(feature = "csr")]
            {
                let session = session.clone();
                let gateway = gateway.clone();
                leptos::task::spawn_local(async move {
                    match session.login(&gateway, &request).await {
                        Ok(_) => {
                            password.set(String::new());
                            info.set(String::new());
                        }
                        Err(e) => info.set(e.to_string()),
                    }
                    busy.set(false);
                });
            }
            #[cfg(not(feature = "csr"))]
            {
                let _ = (&session, &gateway, request);
                busy.set(false);
            }
        }
    };

    let on_register = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let request = match validate_register(&username.get(), &password.get(), &confirm.get(), &email.get()) {
            Ok(request) => request,
            Err(message) => {
                info.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Creating account...".to_owned());

        #[cfg(feature = "csr")]
        {
            let gateway = gateway.clone();
            leptos::task::spawn_local(async move {
                match crate::net::api::register(&gateway, &request).await {
                    Ok(()) => {
                        mode.set(Mode::Login);
                        password.set(String::new());
                        confirm.set(String::new());
                        info.set("Account created. Please sign in.".to_owned());
                    }
                    Err(e) => info.set(e),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&gateway, request);
            busy.set(false);
        }
    };

    let switch_mode = move |_| {
        mode.update(|m| *m = if *m == Mode::Login { Mode::Register } else { Mode::Login });
        info.set(String::new());
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Medical Q&A"</h1>
                <p class="login-card__subtitle">
                    {move || if mode.get() == Mode::Login { "Sign in" } else { "Create an account" }}
                </p>
                <form
                    class="login-form"
                    on:submit=move |ev| if mode.get_untracked() == Mode::Login { on_login(ev) } else { on_register(ev) }
                >
                    <input
                        class="login-input"
                        type="text"
                        placeholder="Username"
                        autocomplete="username"
                        prop:value=move || username.get()
                        on:input=move |ev| username.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <Show when=move || mode.get() == Mode::Register>
                        <input
                            class="login-input"
                            type="password"
                            placeholder="Confirm password"
                            prop:value=move || confirm.get()
                            on:input=move |ev| confirm.set(event_target_value(&ev))
                        />
                        <input
                            class="login-input"
                            type="email"
                            placeholder="you@example.com"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </Show>
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        {move || if mode.get() == Mode::Login { "Sign in" } else { "Register" }}
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
                <button class="login-switch" on:click=switch_mode>
                    {move || if mode.get() == Mode::Login { "No account? Register" } else { "Have an account? Sign in" }}
                </button>
            </div>
        </div>
    }
}
