//! Networking for the REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `gateway` is the single choke point for HTTP: it attaches credentials,
//! runs requests over a `transport`, and collapses every outcome through
//! `envelope` and `error` into one response shape. `api` names the endpoints
//! and `types` defines the wire schema.

pub mod api;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod transport;
pub mod types;
