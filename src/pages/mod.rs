//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns its route-scoped loading and form state and calls
//! `net::api` through the gateway from context. Access control is not a page
//! concern: `components::guarded::Guarded` decides before a page mounts.

pub mod admin;
pub mod auth;
pub mod drug_detail;
pub mod forbidden;
pub mod home;
pub mod not_found;
pub mod qna;
