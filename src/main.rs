#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # cfgrade
//!
//! Grades a directory of group submissions, one subdirectory per group, and
//! prints a table per group. Records can also be written as JSON lines.
//!
//! ```text
//! cfgrade grade submissions/ --output results.jsonl --jobs 4
//! cfgrade params 7
//! ```

use std::{
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use bpaf::*;
use cfgrade::{
    Decision, GradingOrchestrator, GroupParams, GroupResult, MemorySink, ResultSink, Roster,
    config, orchestrator::GroupSubmission, util,
};
use colored::Colorize;
use dotenvy::dotenv;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Options for the `grade` subcommand.
#[derive(Debug, Clone)]
struct GradeArgs {
    /// Directory holding one subdirectory per group.
    dir:    PathBuf,
    /// Roster file.
    roster: Option<PathBuf>,
    /// JSON lines output file.
    output: Option<PathBuf>,
    /// Groups graded at once.
    jobs:   Option<usize>,
    /// Ask before moving on to the next group.
    ask:    bool,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade submissions
    Grade(GradeArgs),
    /// Print expected values for a group
    Params(u32),
}

/// Parse the command line arguments and return the command and verbosity
fn options() -> (bool, Cmd) {
    let dir = positional::<PathBuf>("DIR").help("Directory with one subdirectory per group");
    let roster = long("roster")
        .help("JSON roster used to name each group's representative")
        .argument::<PathBuf>("FILE")
        .optional();
    let output = long("output")
        .short('o')
        .help("Write task and group records as JSON lines")
        .argument::<PathBuf>("FILE")
        .optional();
    let jobs = long("jobs")
        .short('j')
        .help("Grade this many groups at once")
        .argument::<usize>("N")
        .optional();
    let ask = long("ask")
        .help("Ask before grading the next group")
        .switch();

    let grade = construct!(GradeArgs {
        roster,
        output,
        jobs,
        ask,
        dir
    })
    .to_options()
    .command("grade")
    .help("Grade every group in a directory")
    .map(Cmd::Grade);

    let params = positional::<u32>("GROUP")
        .help("Group number")
        .to_options()
        .command("params")
        .help("Print the expected values for a group as JSON")
        .map(Cmd::Params);

    let verbose = long("verbose")
        .short('v')
        .help("Log every failed check")
        .switch();
    let cmd = construct!([grade, params]);

    construct!(verbose, cmd)
        .to_options()
        .descr("Grades network device configurations")
        .run()
}

/// Asks on the terminal whether to grade the next group.
fn ask_to_continue(result: &GroupResult) -> Decision {
    eprint!(
        "{} {} ",
        format!("Finished {}.", result.label()).bold(),
        "Continue to the next group? [Y/n]".yellow()
    );
    io::stderr().flush().ok();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) if answer.trim().eq_ignore_ascii_case("n") => Decision::Stop,
        Ok(_) => Decision::Continue,
        Err(_) => Decision::Stop,
    }
}

/// Prints the table for each group.
fn print_results(results: &[GroupResult]) {
    for result in results {
        eprintln!("{}", util::result_table(result));
    }
    eprintln!("{}", format!("Graded {} group(s).", results.len()).green());
}

/// Runs the `grade` subcommand.
async fn grade(args: GradeArgs) -> Result<()> {
    let mut settings = (*config::ensure_initialized()?).clone();
    if let Some(jobs) = args.jobs {
        settings = settings.with_concurrency(jobs);
    }

    let mut orchestrator = GradingOrchestrator::new(settings);
    if let Some(path) = &args.roster {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read roster {}", path.display()))?;
        orchestrator = orchestrator.with_roster(Roster::from_json(&json)?);
    }

    let groups: Vec<GroupSubmission> = util::load_groups(&args.dir)
        .with_context(|| format!("Could not load submissions from {}", args.dir.display()))?;

    let sink: Box<dyn ResultSink> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Could not create {}", path.display()))?;
            Box::new(util::JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(MemorySink::default()),
    };

    let results = if args.ask || orchestrator.config().concurrency() == 1 {
        let mut sink = sink;
        let decide = |result: &GroupResult| {
            if args.ask {
                ask_to_continue(result)
            } else {
                Decision::Continue
            }
        };
        orchestrator.run(groups, &mut sink, decide)?
    } else {
        let sink = Arc::new(Mutex::new(sink));
        orchestrator.run_concurrent(groups, sink).await?
    };

    print_results(&results);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let (verbose, cmd) = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter_layer = LevelFilter::from_level(level);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match cmd {
        Cmd::Grade(args) => grade(args).await?,
        Cmd::Params(group) => {
            let key = GroupParams::new(group).answer_key();
            println!("{}", serde_json::to_string_pretty(&key)?);
        }
    }

    Ok(())
}
