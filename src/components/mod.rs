//! Reusable UI components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read the shared `AuthState` signal, the `SessionManager` and
//! the gateway from Leptos context; they never touch storage directly.

pub mod app_header;
pub mod guarded;
