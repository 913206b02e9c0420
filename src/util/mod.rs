//! Framework-independent helpers.

pub mod clock;
pub mod jwt;
pub mod storage;
