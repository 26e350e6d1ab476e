#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grading whole groups, one after another or several at once.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use futures::{StreamExt, stream};

use crate::{
    config::GraderConfig,
    error::GradeError,
    grade::{GroupResult, GroupSummary, TaskRecord, catalog, grade_task},
    ios::{DeviceResolver, SubmissionFile},
    params::GroupParams,
    roster::Roster,
};

/// The files one group submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSubmission {
    /// Group label, such as `Group 07 - Team A`.
    label: String,
    /// Submitted files.
    files: Vec<SubmissionFile>,
}

impl GroupSubmission {
    /// A submission labelled `label`.
    pub fn new(label: impl Into<String>, files: Vec<SubmissionFile>) -> Self {
        Self {
            label: label.into(),
            files,
        }
    }

    /// Group label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Submitted files.
    pub fn files(&self) -> &[SubmissionFile] {
        &self.files
    }
}

/// Whether to go on after a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Grade the next group.
    Continue,
    /// End the run.
    Stop,
}

/// Where output records go.
pub trait ResultSink: Send {
    /// Receives one task record, as soon as the task is graded.
    fn task(&mut self, record: &TaskRecord) -> Result<()>;
    /// Receives a group's aggregate, after its last task.
    fn group(&mut self, summary: &GroupSummary) -> Result<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn task(&mut self, record: &TaskRecord) -> Result<()> {
        (**self).task(record)
    }

    fn group(&mut self, summary: &GroupSummary) -> Result<()> {
        (**self).group(summary)
    }
}

/// A sink that keeps everything in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    /// Task records in arrival order.
    pub tasks:  Vec<TaskRecord>,
    /// Group aggregates in arrival order.
    pub groups: Vec<GroupSummary>,
}

impl MemorySink {
    /// Replays everything collected into `sink`.
    pub fn drain_into(&mut self, sink: &mut dyn ResultSink) -> Result<()> {
        for record in self.tasks.drain(..) {
            sink.task(&record)?;
        }
        for summary in self.groups.drain(..) {
            sink.group(&summary)?;
        }
        Ok(())
    }
}

impl ResultSink for MemorySink {
    fn task(&mut self, record: &TaskRecord) -> Result<()> {
        self.tasks.push(record.clone());
        Ok(())
    }

    fn group(&mut self, summary: &GroupSummary) -> Result<()> {
        self.groups.push(summary.clone());
        Ok(())
    }
}

/// Concatenates every ASCII digit of `label` into the group number.
pub fn extract_group_number(label: &str) -> Result<u32, GradeError> {
    let digits: String = label.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|_| GradeError::NoGroupNumber(label.to_string()))
}

/// Drives grading over a set of groups.
#[derive(Debug, Clone)]
pub struct GradingOrchestrator {
    /// Run settings.
    config:   GraderConfig,
    /// Matches files to roles.
    resolver: DeviceResolver,
    /// Optional roster for representative lookups.
    roster:   Option<Roster>,
}

impl GradingOrchestrator {
    /// An orchestrator for `config`.
    pub fn new(config: GraderConfig) -> Self {
        let resolver = DeviceResolver::new(config.min_roles(), config.parse_options());
        Self {
            config,
            resolver,
            roster: None,
        }
    }

    /// Returns a copy that attaches representatives from `roster`.
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Run settings.
    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grades one group, streaming each task record to `sink`.
    pub fn grade_group(
        &self,
        submission: GroupSubmission,
        sink: &mut dyn ResultSink,
    ) -> Result<GroupResult, GradeError> {
        let GroupSubmission { label, files } = submission;
        tracing::info!("Grading {label}...");

        let devices = self.resolver.resolve(files)?;
        let group = extract_group_number(&label)?;
        let params = GroupParams::new(group);

        let mut results = Vec::new();
        for task in catalog::tasks(&params)? {
            let result = grade_task(&task, &devices);
            let record = result.record(&label, self.config.separator());
            if let Err(e) = sink.task(&record) {
                tracing::error!("Could not write {} for {label}: {e:#}", record.task_name);
            }
            results.push(result);
        }

        let representative = self
            .roster
            .as_ref()
            .and_then(|roster| roster.representative(&label))
            .map(str::to_string);

        let result = GroupResult::builder()
            .label(label)
            .group(group)
            .tasks(results)
            .maybe_representative(representative)
            .build();

        let summary = result.summary();
        if let Err(e) = sink.group(&summary) {
            tracing::error!("Could not write the summary for {}: {e:#}", summary.group_label);
        }
        tracing::info!(
            "{}: {:.2}/{:.2} ({:.1}%)",
            summary.group_label,
            summary.total_grade,
            summary.total_max,
            summary.percentage()
        );

        Ok(result)
    }

    /// Grades groups in order, asking `decide` after each whether to go on.
    ///
    /// Groups that cannot be graded are logged and skipped.
    pub fn run(
        &self,
        groups: Vec<GroupSubmission>,
        sink: &mut dyn ResultSink,
        mut decide: impl FnMut(&GroupResult) -> Decision,
    ) -> Result<Vec<GroupResult>, GradeError> {
        if groups.is_empty() {
            return Err(GradeError::NoGroups);
        }

        let total = groups.len();
        let mut results = Vec::new();
        for (index, submission) in groups.into_iter().enumerate() {
            let label = submission.label().to_string();
            match self.grade_group(submission, sink) {
                Ok(result) => {
                    let last = index + 1 == total;
                    let stop = !last && decide(&result) == Decision::Stop;
                    results.push(result);
                    if stop {
                        tracing::info!("Stopping after {label}.");
                        break;
                    }
                }
                Err(e) => tracing::warn!("Skipping {label}: {e}"),
            }
        }

        Ok(results)
    }

    /// Grades groups on blocking tasks, at most `concurrency` at a time.
    ///
    /// Each group's records reach `sink` together, in submission order.
    pub async fn run_concurrent<S>(
        &self,
        groups: Vec<GroupSubmission>,
        sink: Arc<Mutex<S>>,
    ) -> Result<Vec<GroupResult>, GradeError>
    where
        S: ResultSink + 'static,
    {
        if groups.is_empty() {
            return Err(GradeError::NoGroups);
        }

        let shared = Arc::new(self.clone());
        let graded = stream::iter(groups)
            .map(|submission| {
                let this = Arc::clone(&shared);
                let sink = Arc::clone(&sink);
                tokio::task::spawn_blocking(move || {
                    let label = submission.label().to_string();
                    let mut buffer = MemorySink::default();
                    let result = this.grade_group(submission, &mut buffer);

                    let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Err(e) = buffer.drain_into(&mut *sink) {
                        tracing::error!("Could not write results for {label}: {e:#}");
                    }
                    (label, result)
                })
            })
            .buffered(self.config.concurrency())
            .collect::<Vec<_>>()
            .await;

        let mut results = Vec::new();
        for joined in graded {
            match joined {
                Ok((_, Ok(result))) => results.push(result),
                Ok((label, Err(e))) => tracing::warn!("Skipping {label}: {e}"),
                Err(e) => tracing::error!("A grading task failed: {e}"),
            }
        }

        Ok(results)
    }
}

impl Default for GradingOrchestrator {
    fn default() -> Self {
        Self::new(GraderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_concatenated() {
        assert_eq!(extract_group_number("Group 1 - Section 2").expect("digits"), 12);
        assert!(matches!(
            extract_group_number("Group Alpha"),
            Err(GradeError::NoGroupNumber(_))
        ));
        assert!(extract_group_number("99999999999").is_err());
    }
}
