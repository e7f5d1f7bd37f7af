//! Web search providers.
//!
//! The pipeline asks a [`WebSearch`] for candidate URLs. Providers degrade
//! gracefully: a failed search yields an empty list instead of an error, so a
//! direct answer can still be produced when search collapses.

mod duckduckgo;

pub use duckduckgo::{DuckDuckGoSearch, SearchError};

/// A source of ranked result URLs for a query.
pub trait WebSearch: Send + Sync {
    /// Returns up to `num_results` result URLs in provider ranking order.
    ///
    /// `num_results` is a soft cap; fewer (or zero) URLs may come back.
    /// Failures are reported as an empty list.
    fn search(&self, query: &str, num_results: usize) -> Vec<String>;
}
