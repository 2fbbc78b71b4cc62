//! Process-level run ID for match-run snapshots.
//!
//! Each process gets one ULID at startup. Writing match results under the
//! same run id makes retried inserts idempotent while keeping separate runs
//! (even same-day) distinguishable.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// The process-level run ID: generated once per process, time-ordered,
/// 26 chars, URL-safe.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}

/// A fresh ULID for record ids and sub-operations.
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_same_value() {
        assert_eq!(get(), get());
        assert_eq!(get().len(), 26);
    }

    #[test]
    fn generate_returns_unique_sortable_values() {
        let a = generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = generate();
        assert_ne!(a, b);
        assert!(a < b, "ULIDs should be time-ordered");
    }
}
