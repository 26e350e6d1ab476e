#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Evaluation of one task against one group's devices.

use itertools::Itertools;

use super::{
    results::{Grade, TaskResult},
    rule::{Check, Rule, Task},
};
use crate::ios::{ConfigDocument, DeviceMap, Role, Statement};

/// What one rule said about one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Index of the category the rule belongs to.
    pub category:  usize,
    /// Sub-checks this outcome accounts for.
    pub evaluated: usize,
    /// How many of them failed.
    pub failed:    usize,
    /// Feedback, present whenever something failed.
    pub comment:   Option<String>,
}

impl Outcome {
    /// Sub-checks that passed.
    fn pass(category: usize, evaluated: usize) -> Self {
        Self {
            category,
            evaluated,
            failed: 0,
            comment: None,
        }
    }

    /// Sub-checks that all failed, described by a single comment.
    fn fail(category: usize, failed: usize, comment: String) -> Self {
        tracing::debug!("{comment}");
        Self {
            category,
            evaluated: failed,
            failed,
            comment: Some(comment),
        }
    }
}

/// Running totals for one category.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    /// Sub-checks evaluated.
    evaluated: usize,
    /// Sub-checks failed.
    failed:    usize,
}

/// Everything needed to grade one task for one group.
///
/// The context never changes during evaluation; rules produce [`Outcome`]s
/// that are folded into the [`TaskResult`] afterwards.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    /// The task, with expected values already resolved for the group.
    task:    &'a Task,
    /// The group's devices.
    devices: &'a DeviceMap,
}

impl<'a> TaskContext<'a> {
    /// A context for `task` over `devices`.
    pub fn new(task: &'a Task, devices: &'a DeviceMap) -> Self {
        Self { task, devices }
    }

    /// Evaluates every rule against every applicable device present.
    pub fn outcomes(&self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        for (index, category) in self.task.categories().iter().enumerate() {
            for rule in category.rules() {
                for &role in rule.roles() {
                    let Some(device) = self.devices.get(&role) else {
                        continue;
                    };

                    match device.document() {
                        Ok(doc) => outcomes.extend(rule_outcomes(index, rule, role, doc)),
                        Err(e) => {
                            tracing::warn!("{role}: {e}");
                            outcomes.push(Outcome::fail(index, rule.sub_checks(), format!("{role} {e}")));
                        }
                    }
                }
            }
        }
        outcomes
    }

    /// Grades the task.
    pub fn grade(&self) -> TaskResult {
        let categories = self.task.categories();
        let outcomes = self.outcomes();

        let tallies = outcomes.iter().fold(
            vec![Tally::default(); categories.len()],
            |mut tallies, outcome| {
                let tally = &mut tallies[outcome.category];
                tally.evaluated += outcome.evaluated;
                tally.failed += outcome.failed;
                tallies
            },
        );

        let (deductions, bonuses) = categories.iter().zip(&tallies).fold(
            (0.0, 0.0),
            |(deductions, bonuses), (category, tally)| {
                let earned = if tally.evaluated > 0 && tally.failed == 0 {
                    category.bonus()
                } else {
                    0.0
                };
                (deductions + category.delta() * tally.failed as f64, bonuses + earned)
            },
        );

        let out_of = self.task.out_of();
        let grade = (out_of + bonuses - deductions).clamp(0.0, out_of);
        let comments = outcomes
            .into_iter()
            .filter_map(|outcome| outcome.comment)
            .unique()
            .collect_vec();

        tracing::info!("{}: {:.2}/{:.2}", self.task.name(), grade, out_of);
        TaskResult::builder()
            .task(self.task.name())
            .grade(Grade::new(grade, out_of))
            .comments(comments)
            .build()
    }
}

/// Grades `task` against `devices`.
pub fn grade_task(task: &Task, devices: &DeviceMap) -> TaskResult {
    TaskContext::new(task, devices).grade()
}

/// Outcomes of one rule on one device.
fn rule_outcomes(category: usize, rule: &Rule, role: Role, doc: &ConfigDocument) -> Vec<Outcome> {
    match rule {
        Rule::Document { check, .. } => vec![match check.test(doc) {
            Ok(()) => Outcome::pass(category, 1),
            Err(detail) => Outcome::fail(category, 1, format!("{role} {detail}")),
        }],
        Rule::Block { block, checks, .. } => match block.locate(doc) {
            None => vec![Outcome::fail(
                category,
                rule.sub_checks(),
                format!("{role} missing {}", block.label()),
            )],
            Some(stmt) => checks
                .iter()
                .flat_map(|check| check_outcomes(category, check, role, block.label(), doc, stmt))
                .collect(),
        },
    }
}

/// Outcomes of one check against a located block.
fn check_outcomes(
    category: usize,
    check: &Check,
    role: Role,
    label: &str,
    doc: &ConfigDocument,
    stmt: Statement<'_>,
) -> Vec<Outcome> {
    match check {
        Check::Nested { block, checks } => match block.locate_child(stmt) {
            None => vec![Outcome::fail(
                category,
                check.sub_checks(),
                format!("{role} {label}: missing {}", block.label()),
            )],
            Some(child) => {
                let label = format!("{label} / {}", block.label());
                checks
                    .iter()
                    .flat_map(|check| check_outcomes(category, check, role, &label, doc, child))
                    .collect()
            }
        },
        leaf => vec![match leaf.test(doc, stmt) {
            Ok(()) => Outcome::pass(category, 1),
            Err(detail) => Outcome::fail(category, 1, format!("{role} {label}: {detail}")),
        }],
    }
}
