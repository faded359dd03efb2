//! # Error Types
//!
//! The one error that propagates out of the fabric: invalid consensus
//! input. Delivery-path failures (transport, replay log) are recovered
//! internally and never surface as errors to publishers.

use thiserror::Error;

/// Invalid consensus input.
///
/// An empty `id` or `engine` rejects the whole batch: silently grouping
/// empties would merge unrelated issues under a shared empty key and
/// corrupt their classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A hit carried an empty issue id.
    #[error("issue hit at index {index} has an empty id")]
    EmptyIssueId { index: usize },

    /// A hit carried an empty engine name.
    #[error("issue hit at index {index} (issue {id:?}) has an empty engine")]
    EmptyEngine { index: usize, id: String },
}
