#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Errors raised by the grading engine.
//!
//! None of these cross a group boundary: the orchestrator logs them and moves
//! on to the next group. Only [`GradeError::NoGroups`] reaches the caller of
//! a whole run.

use crate::ios::query::QueryError;

/// Errors produced while resolving, parsing or grading one group.
#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// The run was handed no groups at all.
    #[error("No groups were provided to grade.")]
    NoGroups,
    /// The group label has no digits to derive a group number from.
    #[error("Could not extract a group number from `{0}`.")]
    NoGroupNumber(String),
    /// Too few files could be matched to device roles.
    #[error("Only {found} of the required {required} devices could be identified.")]
    InsufficientDevices {
        /// Roles resolved.
        found:    usize,
        /// Roles required.
        required: usize,
    },
    /// A submitted file could not be read.
    #[error("{source_file} is unreadable: {reason}")]
    Unreadable {
        /// File name.
        source_file: String,
        /// Reason reported by the collaborator.
        reason:      String,
    },
    /// A rule pattern failed to compile.
    #[error(transparent)]
    Query(#[from] QueryError),
}
