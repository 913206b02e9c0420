//! Client-side application state.
//!
//! DESIGN
//! ======
//! `session` owns the token and persisted identity; `auth` is the plain
//! snapshot of it that components read through a signal.

pub mod auth;
pub mod session;
