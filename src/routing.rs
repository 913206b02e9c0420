//! Route table and the access decision for each navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! `components::guarded::Guarded` wraps every routed view and asks [`decide`]
//! before mounting it. The decision is a pure function of the path, the
//! current `AuthState`, and the clock.
//!
//! DESIGN
//! ======
//! Paths not in [`ROUTES`] are allowed through so the router's fallback can
//! render "not found". A missing session always redirects to `/auth` with the
//! requested path preserved; a role mismatch goes to `/forbidden`.

#[cfg(test)]
#[path = "routing_test.rs"]
mod routing_test;

use crate::net::types::Role;
use crate::state::auth::AuthState;

pub const HOME_PATH: &str = "/";
pub const AUTH_PATH: &str = "/auth";
pub const FORBIDDEN_PATH: &str = "/forbidden";
pub const REDIRECT_PARAM: &str = "redirect";

/// Screen rendered for a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppView {
    Home,
    DrugDetail,
    Qna,
    Auth,
    Admin,
    Forbidden,
}

/// Who may open a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    /// Authenticated with at least this role.
    Role(Role),
}

impl Access {
    pub fn requires_session(self) -> bool {
        !matches!(self, Self::Public)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Slash-separated pattern; `:name` segments match any single segment.
    pub pattern: &'static str,
    pub view: AppView,
    pub access: Access,
    pub title: &'static str,
}

pub const ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor { pattern: "/", view: AppView::Home, access: Access::Public, title: "Home" },
    RouteDescriptor { pattern: "/home", view: AppView::Home, access: Access::Public, title: "Home" },
    RouteDescriptor { pattern: "/drugs/:id", view: AppView::DrugDetail, access: Access::Public, title: "Drug detail" },
    RouteDescriptor { pattern: "/qna", view: AppView::Qna, access: Access::Authenticated, title: "Medical Q&A" },
    RouteDescriptor { pattern: "/auth", view: AppView::Auth, access: Access::Public, title: "Sign in" },
    RouteDescriptor { pattern: "/admin", view: AppView::Admin, access: Access::Role(Role::Admin), title: "Administration" },
    RouteDescriptor { pattern: "/forbidden", view: AppView::Forbidden, access: Access::Public, title: "Access denied" },
];

/// Outcome of the guard for one navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Look up the route for `path`, ignoring any query string or fragment.
pub fn resolve(path: &str) -> Option<&'static RouteDescriptor> {
    let path = strip_query(path);
    ROUTES.iter().find(|route| matches_pattern(route.pattern, path))
}

/// Decide whether `path` may be shown for `auth` at `now`.
pub fn decide(path: &str, auth: &AuthState, now: i64) -> GuardDecision {
    let Some(route) = resolve(path) else {
        return GuardDecision::Allow;
    };
    if !route.access.requires_session() {
        return GuardDecision::Allow;
    }
    if !auth.is_authenticated_at(now) {
        log::debug!("guard: {} requires a session", route.pattern);
        return GuardDecision::Redirect(login_redirect(path));
    }
    if let Access::Role(required) = route.access {
        let granted = auth.role().is_some_and(|role| role.satisfies(required));
        if !granted {
            log::info!("guard: {} requires role {required}", route.pattern);
            return GuardDecision::Redirect(FORBIDDEN_PATH.to_owned());
        }
    }
    GuardDecision::Allow
}

/// `/auth?redirect=<path>` for a path the user tried to open.
pub fn login_redirect(requested: &str) -> String {
    format!("{AUTH_PATH}?{REDIRECT_PARAM}={}", encode_query_value(requested))
}

/// Where to go after a successful login, read from the auth page's query
/// string. Anything that is not a same-origin absolute path falls back to
/// `/`.
pub fn post_login_target(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let target = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == REDIRECT_PARAM)
        .and_then(|(_, value)| decode_query_value(value));

    match target {
        Some(path) if is_safe_local_path(&path) => path,
        _ => HOME_PATH.to_owned(),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Inverse of [`encode_query_value`]; `+` reads as a space. Returns `None`
/// on a broken escape or invalid UTF-8.
pub fn decode_query_value(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = encoded.get(i + 1..i + 3)?;
                if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn is_safe_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && strip_query(path) != AUTH_PATH
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut want = segments(pattern);
    let mut have = segments(path);
    loop {
        match (want.next(), have.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') || p == s => {}
            _ => return false,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
