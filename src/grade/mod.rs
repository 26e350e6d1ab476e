#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The case-study tasks.
pub mod catalog;
/// Task evaluation.
pub mod context;
/// Shared grade result types.
pub mod results;
/// Rules, categories and tasks.
pub mod rule;

pub use catalog::tasks;
pub use context::{Outcome, TaskContext, grade_task};
pub use results::{Comments, Grade, GroupResult, GroupSummary, TaskRecord, TaskResult};
pub use rule::{Block, BundleProtocol, Category, Check, DocCheck, Rule, Task};
