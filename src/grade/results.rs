#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::constants::COMMENT_SEPARATOR;

#[derive(Debug, Clone, Copy, Default, PartialEq, Builder, Serialize, Deserialize)]
/// A struct representing a grade
pub struct Grade {
    /// The actual grade received
    pub grade:  f64,
    /// The maximum grade possible
    pub out_of: f64,
}

impl Grade {
    /// Creates a new grade -
    /// * `grade` - The actual grade received
    /// * `out_of` - The maximum grade possible
    pub fn new(grade: f64, out_of: f64) -> Self {
        Self { grade, out_of }
    }

    /// Grade as a percentage of the maximum; zero when nothing was possible.
    pub fn percentage(&self) -> f64 {
        if self.out_of > 0.0 {
            self.grade / self.out_of * 100.0
        } else {
            0.0
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}/{:.2}", self.grade, self.out_of)
    }
}

/// Ordered feedback comments for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Comments(Vec<String>);

impl Comments {
    /// Comments in evaluation order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comments joined into a single output field.
    pub fn joined(&self) -> String {
        self.0.join(COMMENT_SEPARATOR)
    }
}

impl From<Vec<String>> for Comments {
    fn from(comments: Vec<String>) -> Self {
        Self(comments)
    }
}

impl Display for Comments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}

#[derive(Tabled, Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
/// Outcome of grading one task for one group
pub struct TaskResult {
    #[tabled(rename = "Task")]
    /// * `task`: name of the task
    pub(crate) task:     String,
    #[tabled(rename = "Grade")]
    /// * `grade`: grade received, clamped to the task maximum
    #[builder(default)]
    pub(crate) grade:    Grade,
    #[tabled(rename = "Comments")]
    /// * `comments`: what was wrong, in evaluation order
    #[builder(default, into)]
    pub(crate) comments: Comments,
}

impl TaskResult {
    /// Name of the task.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Returns the underlying grade struct.
    pub fn grade_struct(&self) -> &Grade {
        &self.grade
    }

    /// Returns the numeric grade value.
    pub fn grade_value(&self) -> f64 {
        self.grade.grade
    }

    /// Returns the numeric out-of value.
    pub fn out_of_value(&self) -> f64 {
        self.grade.out_of
    }

    /// Comments in evaluation order.
    pub fn comments(&self) -> &[String] {
        self.comments.as_slice()
    }

    /// Output record for this task, comments joined with `separator`.
    pub fn record(&self, group_label: &str, separator: &str) -> TaskRecord {
        TaskRecord {
            group_label: group_label.to_string(),
            task_name:   self.task.clone(),
            grade:       self.grade.grade,
            out_of:      self.grade.out_of,
            comments:    self.comments.as_slice().join(separator),
        }
    }
}

/// One output row per task per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Group label as submitted.
    pub group_label: String,
    /// Task name.
    pub task_name:   String,
    /// Grade received.
    pub grade:       f64,
    /// Maximum for the task.
    pub out_of:      f64,
    /// Comments joined with the separator.
    pub comments:    String,
}

/// Aggregate emitted once a group's tasks are all graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group label as submitted.
    pub group_label:    String,
    /// Sum of task grades.
    pub total_grade:    f64,
    /// Sum of task maxima.
    pub total_max:      f64,
    /// First listed member of the group, when a roster was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
}

impl GroupSummary {
    /// Total as a percentage of the maximum.
    pub fn percentage(&self) -> f64 {
        Grade::new(self.total_grade, self.total_max).percentage()
    }
}

/// Everything produced for one group.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct GroupResult {
    /// Group label as submitted.
    pub(crate) label:          String,
    /// Number extracted from the label.
    pub(crate) group:          u32,
    /// Task results in declaration order.
    #[builder(default)]
    pub(crate) tasks:          Vec<TaskResult>,
    /// First listed member of the group.
    pub(crate) representative: Option<String>,
}

impl GroupResult {
    /// Group label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Group number.
    pub fn group(&self) -> u32 {
        self.group
    }

    /// Task results in declaration order.
    pub fn tasks(&self) -> &[TaskResult] {
        &self.tasks
    }

    /// Representative submitter, if known.
    pub fn representative(&self) -> Option<&str> {
        self.representative.as_deref()
    }

    /// Sum of task grades and maxima.
    pub fn total(&self) -> Grade {
        self.tasks.iter().fold(Grade::default(), |acc, task| {
            Grade::new(acc.grade + task.grade_value(), acc.out_of + task.out_of_value())
        })
    }

    /// The aggregate record.
    pub fn summary(&self) -> GroupSummary {
        let total = self.total();
        GroupSummary {
            group_label:    self.label.clone(),
            total_grade:    total.grade,
            total_max:      total.out_of,
            representative: self.representative.clone(),
        }
    }
}
