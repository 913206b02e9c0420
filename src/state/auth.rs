//! Auth snapshot consumed by the route guard and the header.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionManager` pushes a fresh `AuthState` into an `RwSignal` after every
//! transition. Components read the signal; they never touch storage.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::{Role, SessionUser};
use crate::state::session::Session;
use crate::util::jwt;

/// Reactive view of the current session: who is signed in and until when.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<SessionUser>,
    pub expires_at: Option<i64>,
}

impl AuthState {
    pub fn from_session(session: &Session) -> Self {
        Self { user: session.user().cloned(), expires_at: session.expires_at() }
    }

    /// Signed in with a token that has not reached its `exp` at `now`.
    pub fn is_authenticated_at(&self, now: i64) -> bool {
        self.user.is_some() && self.expires_at.is_some_and(|exp| now < exp)
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Header label such as `"1h 5m"`; `None` when signed out.
    pub fn remaining_label(&self, now: i64) -> Option<String> {
        self.user.as_ref()?;
        let exp = self.expires_at?;
        Some(jwt::format_remaining(exp.saturating_sub(now)))
    }
}
