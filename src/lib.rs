//! # cfgrade
//!
//! A rule-based grader for network device configuration case studies. Each
//! group submits one configuration file per device; every file is parsed into
//! a statement tree, matched to a device role and checked against a catalogue
//! of tasks whose expected values depend on the group number.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Runtime settings read from the environment
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Errors raised while grading a group
pub mod error;
/// For all things related to grading
pub mod grade;
/// Parsing, querying and identifying device configurations
pub mod ios;
/// Grading whole groups
pub mod orchestrator;
/// Group-specific expected values
pub mod params;
/// Course roster lookups
pub mod roster;
/// Utility functions for convenience
pub mod util;

pub use config::GraderConfig;
pub use error::GradeError;
pub use grade::{Grade, GroupResult, GroupSummary, TaskRecord, TaskResult};
pub use ios::{ConfigDocument, DeviceRecord, DeviceResolver, Role, SubmissionFile};
pub use orchestrator::{
    Decision, GradingOrchestrator, GroupSubmission, MemorySink, ResultSink, extract_group_number,
};
pub use params::GroupParams;
pub use roster::Roster;
