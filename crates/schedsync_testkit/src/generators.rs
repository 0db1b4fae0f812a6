//! Property-based test generators using proptest.
//!
//! Anchor and header pools are deliberately small so that duplicates,
//! blanks and case-only differences show up often.

use proptest::prelude::*;
use schedsync_core::SyncRow;

/// Strategy for a single grid header label, possibly blank.
pub fn header_label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(vec!["Area", "area", "AREA", "Level", "Mark", "Area_2"])
            .prop_map(String::from),
        2 => prop::string::string_regex("[A-Za-z][A-Za-z ]{0,7}").expect("Invalid regex"),
        1 => Just(String::new()),
    ]
}

/// Strategy for a header row of `1..max_len` labels.
pub fn header_row_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(header_label_strategy(), 1..max_len.max(2))
}

/// Strategy for a single anchor drawn from a small pool, or blank.
pub fn anchor_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => prop::string::string_regex("uid-[a-c][0-3]").expect("Invalid regex"),
        1 => Just(String::new()),
    ]
}

/// Strategy for a batch of anchors that often repeats itself.
pub fn anchor_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(anchor_strategy(), 0..max_len.max(1))
}

/// Strategy for a text value a real field accepts.
pub fn real_text_strategy() -> impl Strategy<Value = String> {
    (0u32..100_000, 0u32..100).prop_map(|(whole, frac)| format!("{whole}.{frac}"))
}

/// Strategy for incoming rows that carry a `Length` cell.
pub fn incoming_rows_strategy(max_len: usize) -> impl Strategy<Value = Vec<SyncRow>> {
    prop::collection::vec(
        (anchor_strategy(), real_text_strategy())
            .prop_map(|(anchor, length)| SyncRow::new(anchor).with_cell("Length", length)),
        0..max_len.max(1),
    )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
