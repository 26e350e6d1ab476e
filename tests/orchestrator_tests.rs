//! End-to-end tests for grading whole groups.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use cfgrade::{
    Decision, GradeError, GraderConfig, GradingOrchestrator, GroupSubmission, MemorySink, Roster,
    SubmissionFile,
    util::{JsonLinesSink, load_groups, result_table},
};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn submissions() -> Vec<GroupSubmission> {
    load_groups(&fixtures().join("submissions")).expect("load fixture groups")
}

fn roster() -> Roster {
    let json = std::fs::read_to_string(fixtures().join("roster.json")).expect("read roster");
    Roster::from_json(&json).expect("parse roster")
}

fn orchestrator() -> GradingOrchestrator {
    GradingOrchestrator::new(GraderConfig::default().with_concurrency(2)).with_roster(roster())
}

#[test]
fn fixture_groups_load_in_name_order() {
    let groups = submissions();
    let labels: Vec<&str> = groups.iter().map(GroupSubmission::label).collect();

    assert_eq!(labels, vec!["Group 07 - Team A", "Group 12 - Team B"]);
    assert_eq!(groups[0].files().len(), 8);
    assert_eq!(groups[1].files().len(), 3);
}

#[test]
fn group_names_with_glob_characters_keep_their_files() {
    let groups = load_groups(&fixtures().join("bracketed")).expect("load bracketed group");

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label(), "Group [7] - Team C");
    assert_eq!(groups[0].files().len(), 4);

    let mut sink = MemorySink::default();
    let result = orchestrator()
        .grade_group(groups.into_iter().next().expect("one group"), &mut sink)
        .expect("four roles");
    assert_eq!(result.group(), 7);
}

#[test]
fn sequential_run_grades_and_skips() {
    let mut sink = MemorySink::default();
    let mut asked = 0;
    let results = orchestrator()
        .run(submissions(), &mut sink, |_| {
            asked += 1;
            Decision::Continue
        })
        .expect("run");

    assert_eq!(asked, 1);
    assert_eq!(results.len(), 1);

    let group = &results[0];
    assert_eq!(group.group(), 7);
    assert_eq!(group.representative(), Some("Avery Chen"));
    assert_eq!(group.tasks().len(), 8);
    assert!((group.total().grade - 100.0).abs() < 1e-9);

    assert_eq!(sink.tasks.len(), 8);
    assert!(sink.tasks.iter().all(|record| record.group_label == "Group 07 - Team A"));
    assert_eq!(sink.tasks[0].task_name, "Task 1: Addressing");
    assert_eq!(sink.groups.len(), 1);
    assert_eq!(sink.groups[0].representative.as_deref(), Some("Avery Chen"));
}

#[test]
fn stop_ends_the_run_early() {
    let mut groups = submissions();
    groups.reverse();
    let rerun = GroupSubmission::new("Group 07 - Rerun", groups[1].files().to_vec());
    groups.insert(0, rerun);

    let mut sink = MemorySink::default();
    let results = orchestrator()
        .run(groups, &mut sink, |_| Decision::Stop)
        .expect("run");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].label(), "Group 07 - Rerun");
    assert_eq!(results[0].representative(), None);
    assert_eq!(sink.groups.len(), 1);
}

#[test]
fn no_groups_is_an_error() {
    let mut sink = MemorySink::default();
    let err = orchestrator()
        .run(Vec::new(), &mut sink, |_| Decision::Continue)
        .expect_err("nothing to grade");

    assert!(matches!(err, GradeError::NoGroups));
}

#[test]
fn group_without_number_is_skipped() {
    let files = submissions().remove(0).files().to_vec();
    let mut sink = MemorySink::default();
    let results = orchestrator()
        .run(vec![GroupSubmission::new("Team Alpha", files)], &mut sink, |_| Decision::Continue)
        .expect("run");

    assert!(results.is_empty());
    assert!(sink.tasks.is_empty());
}

#[test]
fn empty_submissions_score_zero() {
    let files = ["Toronto", "ISP", "Ottawa", "Oshawa", "TOR-D1", "TOR-D2", "TOR-A1", "TOR-A2"]
        .into_iter()
        .map(|name| format!("{name}.txt"))
        .map(|name| SubmissionFile::new(name, ""))
        .collect();
    let mut sink = MemorySink::default();
    let result = orchestrator()
        .grade_group(GroupSubmission::new("Group 3", files), &mut sink)
        .expect("eight roles");

    assert_eq!(result.group(), 3);
    assert!(result.total().grade.abs() < 1e-9);
    assert!(sink.tasks.iter().all(|record| !record.comments.is_empty()));
}

#[tokio::test]
async fn concurrent_run_keeps_submission_order() {
    let mut groups = submissions();
    let perfect = groups[0].files().to_vec();
    groups.push(GroupSubmission::new("Group 07 - Copy", perfect));

    let sink = Arc::new(Mutex::new(MemorySink::default()));
    let results = orchestrator()
        .run_concurrent(groups, Arc::clone(&sink))
        .await
        .expect("run");

    let labels: Vec<&str> = results.iter().map(|result| result.label()).collect();
    assert_eq!(labels, vec!["Group 07 - Team A", "Group 07 - Copy"]);

    let sink = sink.lock().expect("sink");
    assert_eq!(sink.tasks.len(), 16);
    assert!(sink.tasks[..8].iter().all(|record| record.group_label == "Group 07 - Team A"));
    assert!(sink.tasks[8..].iter().all(|record| record.group_label == "Group 07 - Copy"));
    assert_eq!(sink.groups.len(), 2);
}

#[tokio::test]
async fn concurrent_run_without_groups_fails() {
    let sink = Arc::new(Mutex::new(MemorySink::default()));
    let err = orchestrator()
        .run_concurrent(Vec::new(), sink)
        .await
        .expect_err("nothing to grade");

    assert!(matches!(err, GradeError::NoGroups));
}

#[test]
fn json_lines_output() {
    let mut sink = JsonLinesSink::new(Vec::new());
    let result = orchestrator()
        .grade_group(submissions().remove(0), &mut sink)
        .expect("grade");

    let output = String::from_utf8(sink.into_inner()).expect("utf-8");
    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    assert_eq!(lines.len(), 9);
    assert_eq!(lines[0]["kind"], "task");
    assert_eq!(lines[0]["group_label"], "Group 07 - Team A");
    assert_eq!(lines[0]["out_of"], 10.0);
    assert_eq!(lines[8]["kind"], "group");
    assert_eq!(lines[8]["total_max"], 100.0);
    assert_eq!(lines[8]["representative"], "Avery Chen");

    let table = result_table(&result);
    assert!(table.contains("Group 07 - Team A (Avery Chen)"));
    assert!(table.contains("Task 8: IP Services"));
}
