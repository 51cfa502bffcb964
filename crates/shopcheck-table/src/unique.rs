//! Rewriting placeholder e-mail addresses into values no earlier run has used.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNIQUE_MARKER: &str = "{unique}";
const FALLBACK_DOMAIN: &str = "example.com";

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Epoch milliseconds, strictly increasing across calls within this process.
pub fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut prev = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_STAMP.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

pub fn materialize_email(raw: &str) -> String {
    materialize_with_stamp(raw, next_stamp())
}

pub fn materialize_with_stamp(raw: &str, stamp: u64) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return format!("auto{}@{}", stamp, FALLBACK_DOMAIN);
    }

    let at = raw.find('@').filter(|&i| i > 0);
    match (raw.contains(UNIQUE_MARKER), at) {
        (true, Some(at)) => {
            let local = raw[..at].replace(UNIQUE_MARKER, &format!("+{}", stamp));
            format!("{}@{}", local, &raw[at + 1..])
        }
        (true, None) => format!(
            "{}@{}",
            raw.replace(UNIQUE_MARKER, &stamp.to_string()),
            FALLBACK_DOMAIN
        ),
        (false, Some(at)) => format!("{}+{}@{}", &raw[..at], stamp, &raw[at + 1..]),
        (false, None) => format!("{}+{}@{}", raw, stamp, FALLBACK_DOMAIN),
    }
}
