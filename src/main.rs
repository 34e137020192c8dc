//! mclub CLI - gather files from many folders into one destination

use clap::Parser;
use mclub::config::{CliArgs, CopyConfig, OutputFormat};
use mclub::core::{CopyEngine, CopyEvent, CopyPlan, RunSummary, Session, SessionState};
use mclub::error::{MclubError, Result};
use mclub::fs::{SpaceProbe, SystemSpaceProbe};
use mclub::progress::ProgressReporter;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    // RUST_LOG wins; otherwise -v / -q pick the level
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the run was clean
fn run(args: CliArgs) -> Result<bool> {
    let config = CopyConfig::from_cli(&args).map_err(MclubError::ConfigError)?;

    if args.verbose > 0 && !args.quiet {
        print_config(&config);
    }

    if config.preview {
        return preview(&config, args.output_format);
    }

    let progress = if args.progress && !args.quiet {
        ProgressReporter::new()
    } else {
        ProgressReporter::disabled()
    };

    let handle = CopyEngine::new(config).spawn();
    let mut session = Session::new();
    session.begin()?;

    // Ctrl-C stops between files so no destination is left half written
    let canceller = handle.canceller();
    ctrlc::set_handler(move || {
        tracing::warn!("Cancelling after the current file");
        canceller.cancel();
    })
    .map_err(|e| MclubError::config(format!("cannot install Ctrl-C handler: {e}")))?;

    for event in handle.events().iter() {
        match &event {
            CopyEvent::Planned { files_total, bytes_total, .. } => progress.begin(*files_total, *bytes_total),
            CopyEvent::Progress {
                current_file,
                bytes_done,
                files_done,
                ..
            } => progress.update(current_file, *bytes_done, *files_done),
            CopyEvent::SpaceCheckFailed { .. } => progress.finish_error("Not enough space"),
            CopyEvent::Finished(summary) if summary.is_success() => progress.finish_success("Copy complete"),
            CopyEvent::Finished(summary) if summary.cancelled => progress.finish_error("Cancelled"),
            CopyEvent::Finished(_) => progress.finish_error("Completed with errors"),
            CopyEvent::Failed(message) => progress.finish_error(message),
        }
        session.apply(event)?;
        if !session.is_busy() {
            break;
        }
    }

    // The terminal event already carries the outcome
    let _ = handle.join();

    match session.state() {
        SessionState::Done(summary) => {
            report_summary(summary, args.output_format, args.quiet)?;
            Ok(summary.is_success())
        }
        SessionState::CopySpaceCheckFailed { required, available } => {
            print_space_failure(*required, *available);
            Ok(false)
        }
        state => Err(MclubError::config(
            session
                .last_error()
                .map(str::to_string)
                .unwrap_or_else(|| format!("copy worker stopped while {}", state)),
        )),
    }
}

#[derive(Serialize)]
struct PreviewReport<'a> {
    plan: &'a CopyPlan,
    required_bytes: u64,
    available_bytes: u64,
    fits: bool,
}

fn preview(config: &CopyConfig, format: OutputFormat) -> Result<bool> {
    let engine = CopyEngine::new(config.clone());
    let (listing, plan) = engine.plan()?;

    let required = plan.required_bytes();
    let available = SystemSpaceProbe.available_space(&plan.destination_root)?;
    let fits = required <= available;

    match format {
        OutputFormat::Json => {
            let report = PreviewReport {
                plan: &plan,
                required_bytes: required,
                available_bytes: available,
                fits,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("=== Preview ===");
            for task in &plan.tasks {
                println!(
                    "{} -> {} [{:?}]",
                    task.source.display(),
                    task.destination.display(),
                    task.overwrite_decision
                );
            }
            for failure in &listing.errors {
                println!("! {} - {}", failure.path.display(), failure.message);
            }
            if plan.is_empty() {
                println!("Nothing to copy.");
            }
            println!();
            println!("Found:      {} files", listing.file_count());
            println!("Files:      {} to write, {} kept", plan.write_count(), plan.skip_count());
            if plan.renamed > 0 {
                println!("Renamed:    {}", plan.renamed);
            }
            println!("Required:   {}", humansize::format_size(required, humansize::BINARY));
            println!("Available:  {}", humansize::format_size(available, humansize::BINARY));
            if !fits {
                print_space_failure(required, available);
            }
        }
    }

    Ok(fits && listing.errors.is_empty())
}

fn report_summary(summary: &RunSummary, format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", summary.to_json()?),
        OutputFormat::Text if !quiet => summary.print_summary(),
        OutputFormat::Text => {
            for failure in &summary.errors {
                eprintln!("{} - {}", failure.path.display(), failure.message);
            }
        }
    }
    Ok(())
}

fn print_space_failure(required: u64, available: u64) {
    eprintln!(
        "Not enough space: {} required, {} available ({} short)",
        humansize::format_size(required, humansize::BINARY),
        humansize::format_size(available, humansize::BINARY),
        humansize::format_size(required.saturating_sub(available), humansize::BINARY)
    );
}

fn print_config(config: &CopyConfig) {
    println!("=== Configuration ===");
    for source in &config.sources {
        println!("Source:      {:?}", source);
    }
    println!("Destination: {:?}", config.destination);
    println!("Flatten:     {}", config.flatten_depth);
    println!("Overwrite:   {}", config.overwrite.name());
    println!("Collisions:  {:?}", config.collision);
    println!();
}
