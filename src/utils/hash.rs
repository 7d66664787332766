//! Id generation using FxHash.
//!
//! Uses `rustc_hash::FxHasher` for fast hashing of small data.
//! Used for id suffixes where uniqueness within one blog is all that matters.
//!
//! ```ignore
//! let id = hash::unique_id("post title"); // -> "lx6…" + suffix
//! let n = hash::base36(1_717_900_000_000); // -> "lx6…"
//! ```

use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowercase base-36 rendering of `n`.
pub fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Process-wide counter mixed into ids so two ids minted in the same
/// millisecond still differ.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Time-ordered unique id: base-36 milliseconds plus a short hash suffix.
///
/// `seed` (usually a title) only perturbs the suffix.
pub fn unique_id(seed: &str) -> String {
    let millis = now_millis();
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = FxHasher::default();
    hasher.write_u64(millis);
    hasher.write_u64(count);
    hasher.write(seed.as_bytes());
    let suffix = base36(hasher.finish());

    format!("{}{}", base36(millis), &suffix[..suffix.len().min(5)])
}
