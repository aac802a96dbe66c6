//! Challenge nonce generation.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Last nonce handed out by this process.
static LAST_CHALLENGE: AtomicI64 = AtomicI64::new(0);

/// Produce a fresh challenge nonce.
///
/// The nonce is a millisecond Unix timestamp rendered in decimal. Values are
/// strictly increasing within the process: if the clock has not moved (or has
/// moved backwards) since the previous call, the previous value plus one is
/// used instead.
pub fn generate_challenge() -> String {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_CHALLENGE
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(next_after(last, now))
        })
        .unwrap_or_else(|last| last);

    next_after(previous, now).to_string()
}

fn next_after(last: i64, now: i64) -> i64 {
    now.max(last.saturating_add(1))
}
