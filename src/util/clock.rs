//! Wall-clock seconds for token expiry checks.
//!
//! `std::time::SystemTime` panics on `wasm32-unknown-unknown`, so the
//! browser build reads `Date.now()` instead.

/// Seconds since the Unix epoch.
pub fn now_unix_secs() -> i64 {
    #[cfg(feature = "csr")]
    {
        #[allow(clippy::cast_possible_truncation)]
        let secs = (js_sys::Date::now() / 1000.0).floor() as i64;
        secs
    }
    #[cfg(not(feature = "csr"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}
