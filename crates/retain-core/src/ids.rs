//! Process-local identifier generation.
//!
//! Records are keyed by short prefixed ids (`sess_…`, `hyp_…`, `test_…`).
//! Uniqueness holds within a process; sessions are in-memory only, so
//! globally unique ids are not required.

use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Produce the next id with the given prefix, e.g. `hyp_42`.
pub fn next_id(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = next_id("hyp");
        let b = next_id("hyp");
        assert!(a.starts_with("hyp_"));
        assert_ne!(a, b);
    }
}
