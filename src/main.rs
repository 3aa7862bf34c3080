use std::{io, process::exit, time::Instant};

use clap::Parser;
use tracing::{debug, error, info, trace, warn};

use crate::{
    command::{CommandBuilder, Invocation},
    config::{SyncConfig, SyncMode},
    error::Error,
    estimate::Stats,
    gate::{Risk, RiskGate, Verdict},
    moves::MoveDetector,
    prompt::Choice,
    report::Report,
    target::{Source, Target, folder_names_differ},
};

mod args;
mod command;
mod config;
mod error;
mod estimate;
mod gate;
mod itemize;
mod logging;
mod moves;
mod prompt;
mod report;
mod runner;
mod target;

/// stopped after the dry run (`--simulate`)
const EXIT_SIMULATED: i32 = 100;
/// dangerous changes detected, see `--force`
const EXIT_BLOCKED: i32 = 101;
/// declined in the `--ask` menu
const EXIT_ABORTED: i32 = 102;
/// bad arguments, missing target, rsync not runnable.
/// if rsync itself fails, its exit code is used instead.
const EXIT_ERROR: i32 = 103;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    Simulated,
    Blocked,
    Aborted,
}

impl Outcome {
    fn code(self) -> i32 {
        match self {
            Self::Done => 0,
            Self::Simulated => EXIT_SIMULATED,
            Self::Blocked => EXIT_BLOCKED,
            Self::Aborted => EXIT_ABORTED,
        }
    }
}

fn main() {
    let args = args::Args::parse();
    logging::init(args.verbose);
    let started = Instant::now();
    let config = SyncConfig::from_args(&args);
    let verbose = config.verbose;
    let code = match run(config, &args.target) {
        Ok(outcome) => outcome.code(),
        Err(e) => {
            error!("{e}");
            match e {
                Error::ToolFailed(code) => code,
                _ => EXIT_ERROR,
            }
        }
    };
    if verbose {
        info!(
            "Finished after {:.1} minutes.",
            started.elapsed().as_secs_f64() / 60.0
        );
    }
    exit(code);
}

fn run(mut config: SyncConfig, target: &str) -> Result<Outcome, Error> {
    let cwd = std::env::current_dir()
        .and_then(|d| d.canonicalize())
        .map_err(Error::CurrentDir)?;
    let source = Source::new(cwd, config.file.as_deref())?;
    let target = Target::parse(target, config.user.as_deref())?.resolve()?;
    source.check_target(&target)?;
    let names_differ = folder_names_differ(&source, &target);
    if let Verdict::Blocked(risks) = RiskGate::new(&config).preflight(names_differ) {
        return Ok(blocked(&risks));
    }
    if names_differ {
        warn!("source and target folder names differ");
    }
    debug!("Operation: {}", config.operation());
    debug!("Source: {}", source.rsync_arg());
    debug!("Target: {}", target.rsync_arg());

    let program = command::rsync_program();
    let version = runner::version(&program)?;
    info!("Detected rsync version {version}");
    let commands = CommandBuilder {
        program,
        source: &source,
        target: &target,
        version,
    };

    if config.estimate {
        let cmd = commands.estimate(&config);
        debug!("Analyzing: {cmd}");
        let stats = Stats::parse(&runner::capture(&cmd)?)?;
        println!("{}", stats.describe());
        if !config.ask {
            println!("Hit Enter to continue.");
            io::stdin().read_line(&mut String::new())?;
        }
    }

    // single files and pure additions can't destroy anything, no need to look before
    if config.file.is_none() && (config.simulate || config.mode != SyncMode::Add) {
        let cmd = commands.sync(&config, true);
        debug!("Simulating: {cmd}");
        let report = dry_run(&cmd, &config, &source, &target)?;
        for line in report.summary() {
            println!("{line}");
        }
        if report.is_empty() {
            println!("Nothing to do.");
            return Ok(if config.simulate {
                Outcome::Simulated
            } else {
                Outcome::Done
            });
        }
        if config.ask {
            let choice = prompt::ask(
                &report,
                config.mode,
                &mut io::stdin().lock(),
                &mut io::stdout(),
            )?;
            match choice {
                Choice::Continue => config.force = true,
                Choice::Switch(mode) => {
                    info!("switching to {mode} mode");
                    config.mode = mode;
                    config.force = true;
                }
                Choice::Abort => return Ok(Outcome::Aborted),
            }
        }
        match RiskGate::new(&config).evaluate(names_differ, &report) {
            Verdict::Simulated => return Ok(Outcome::Simulated),
            Verdict::Blocked(risks) => return Ok(blocked(&risks)),
            Verdict::Proceed => {}
        }
    } else if config.simulate {
        return Ok(Outcome::Simulated);
    }

    let cmd = commands.sync(&config, false);
    debug!("Executing: {cmd}");
    runner::execute(&cmd)?;
    Ok(Outcome::Done)
}

/// Runs the dry run and groups its itemized output.
fn dry_run(
    cmd: &Invocation,
    config: &SyncConfig,
    source: &Source,
    target: &Target,
) -> Result<Report, Error> {
    let mut events = Vec::new();
    runner::stream(cmd, |line| {
        trace!("{line}");
        match itemize::parse_line(line) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => warn!("skipping rsync output: {e}"),
        }
    })?;
    let mut events = report::relevant(events, &config.exclusions);
    let target_dir = match target {
        Target::Local(dir) => Some(dir.as_path()),
        Target::Remote { .. } => None,
    };
    if target.is_remote() {
        debug!("no file sizes for remote targets, move detection relies on names");
    }
    report::attach_sizes(&mut events, &source.dir, target_dir);
    let detector = MoveDetector::with_threshold(config.move_threshold);
    let detect_dir_moves = config.mode != SyncMode::Add && !config.skip_move;
    Ok(Report::new(&events, &detector, detect_dir_moves))
}

fn blocked(risks: &[Risk]) -> Outcome {
    warn!("Potentially harmful changes detected:");
    for risk in risks {
        warn!("  {risk}");
    }
    if risks.iter().any(|r| *r != Risk::FolderName) {
        warn!("Use --force or -y to run rsync anyway, or --ask to review the changes.");
    }
    Outcome::Blocked
}
