mod audit;
mod baseline_file;
mod checksum;
mod cli;
mod interactive;
mod render;
mod report;
mod store;
mod tree;
mod util;

use audit::{AuditError, BaselineOptions, build_baseline, check_integrity};
use cli::{Cli, Command};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;
use store::BaselineStore;
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber, error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct FimExitCode;

impl FimExitCode {
    /// Exit code used when a check found differences.
    fn changes_found() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used when there is no baseline to check against.
    fn no_baseline() -> ExitCode {
        ExitCode::from(2)
    }

    /// Exit code used for other errors (I/O errors, corrupt baseline, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    // Change working directory if -C was specified
    if let Some(directory) = &cli.directory
        && let Err(e) = std::env::set_current_dir(directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return FimExitCode::any_error();
    }

    let store = BaselineStore::new(cli.baseline_file);

    let command = match cli.command {
        Some(command) => command,
        None => match interactive::prompt_command() {
            Ok(command) => command,
            Err(err) => {
                error!("{err}");
                return FimExitCode::any_error();
            }
        },
    };

    let result: Result<ExitCode, AuditError> = match command {
        Command::Baseline {
            dir,
            fingerprint,
            dry_run,
        } => handle_baseline(&store, dir, fingerprint, dry_run),
        Command::Check { dir, diff } => handle_check(&store, dir, diff),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(AuditError::NotFound(path)) => {
            warn!(
                "No baseline found at {}. Create one first with 'fimcheck baseline'.",
                path.display()
            );
            FimExitCode::no_baseline()
        }
        Err(err) => {
            error!("{err}");
            FimExitCode::any_error()
        }
    }
}

fn handle_baseline(
    store: &BaselineStore,
    dir: PathBuf,
    fingerprint: Option<String>,
    dry_run: bool,
) -> Result<ExitCode, AuditError> {
    info!("Building baseline for {}", dir.display());

    let options = BaselineOptions {
        fingerprint,
        dry_run,
    };

    let result = build_baseline(store, &dir, options)?;

    info!(
        "Baselined {} files in {}",
        result.baseline.files.len(),
        result.baseline.base_dir.display()
    );

    if !result.written {
        info!("DRY RUN - {} was not modified", store.path().display());
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_check(
    store: &BaselineStore,
    dir: Option<PathBuf>,
    diff: bool,
) -> Result<ExitCode, AuditError> {
    let outcome = check_integrity(store, dir.as_deref())?;
    let report = &outcome.report;

    if report.is_clean() {
        println!("{}", render::format_summary(report));
        info!(
            "Check successful: {} files unchanged, no modified, added or removed files",
            report.unchanged
        );
        return Ok(ExitCode::SUCCESS);
    }

    render::print_report(&outcome, diff);

    let fingerprint = report.fingerprint();
    println!();
    println!("{}", render::format_summary(report));
    println!("Fingerprint: {}", fingerprint);

    warn!(
        "Check found {} change(s) in {}: {} modified, {} added, {} removed",
        report.total_changes(),
        report.root.display(),
        report.modified.len(),
        report.added.len(),
        report.removed.len()
    );
    info!(
        "Run 'fimcheck baseline --dir {} --fingerprint {}' to accept these changes.",
        report.root.display(),
        fingerprint
    );

    Ok(FimExitCode::changes_found())
}

fn init_tracing(verbose: u8, log_level: Option<LevelFilter>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let explicit_level = log_level.or(match verbose {
        0 => None,
        1 => Some(LevelFilter::INFO),
        _ => Some(LevelFilter::DEBUG),
    });

    let filter = match explicit_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
