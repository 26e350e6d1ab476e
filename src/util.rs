#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use serde::Serialize;
use tabled::{
    Table,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::{
    grade::{GroupResult, GroupSummary, TaskRecord},
    ios::SubmissionFile,
    orchestrator::{GroupSubmission, ResultSink},
};

/// A glob utility function returning the paths directly under `root_dir`
/// that satisfy `keep`, sorted by name. `root_dir` is matched literally.
fn entries_under(root_dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let root = root_dir
        .to_str()
        .context("Could not convert root_dir to string")?;
    let mut pattern = PathBuf::from(Pattern::escape(root));
    pattern.push("*");
    let pattern = pattern
        .to_str()
        .context("Could not convert the glob pattern to string")?
        .to_string();

    let mut paths: Vec<PathBuf> = glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .filter(|path| keep(path))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Reads every file directly inside `group_dir`.
///
/// Files that cannot be read become unreadable submissions instead of
/// errors.
pub fn load_group(group_dir: &Path) -> Result<GroupSubmission> {
    let label = group_dir
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Could not read the group name of {}", group_dir.display()))?
        .to_string();

    let files = entries_under(group_dir, Path::is_file)?
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match std::fs::read(&path) {
                Ok(bytes) => SubmissionFile::from_bytes(name, bytes),
                Err(e) => {
                    tracing::warn!("Could not read {}: {e}", path.display());
                    SubmissionFile::unreadable(name, e.to_string())
                }
            }
        })
        .collect();

    Ok(GroupSubmission::new(label, files))
}

/// Loads every subdirectory of `root_dir` as one group.
pub fn load_groups(root_dir: &Path) -> Result<Vec<GroupSubmission>> {
    entries_under(root_dir, Path::is_dir)?
        .iter()
        .map(|dir| load_group(dir))
        .collect()
}

/// One line of JSON output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutputLine<'a> {
    /// A graded task.
    Task(&'a TaskRecord),
    /// A finished group.
    Group(&'a GroupSummary),
}

/// Writes every record as a line of JSON.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    /// Destination.
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// A sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Serializes one line.
    fn write_line(&mut self, line: &OutputLine<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line).context("Failed to serialize record")?;
        writeln!(self.writer).context("Failed to write record")?;
        self.writer.flush().context("Failed to flush records")
    }
}

impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    fn task(&mut self, record: &TaskRecord) -> Result<()> {
        self.write_line(&OutputLine::Task(record))
    }

    fn group(&mut self, summary: &GroupSummary) -> Result<()> {
        self.write_line(&OutputLine::Group(summary))
    }
}

/// Renders a group's task results as a table.
pub fn result_table(result: &GroupResult) -> String {
    let total = result.total();
    let header = match result.representative() {
        Some(name) => format!("{} ({name})", result.label()),
        None => result.label().to_string(),
    };

    Table::new(result.tasks())
        .with(Panel::header(header))
        .with(Panel::footer(format!("Total: {total} ({:.1}%)", total.percentage())))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(
            Modify::new(Rows::last())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}
