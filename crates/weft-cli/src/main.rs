//! `weft` binary: renders a composition to SVG, or only checks it, and
//! reports its diagnostics.

use std::{process::ExitCode, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};
use miette::GraphicalReportHandler;

use weft::WeftError;
use weft_cli::{
    Args,
    error_adapter::{Reportable, to_reportables},
};

fn init_logging(level: &str) {
    let filter = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .init();
}

/// Logs `reportable` as a rendered miette report.
fn report(handler: &GraphicalReportHandler, reportable: &Reportable<'_>) {
    let mut rendered = String::new();
    if let Err(err) = handler.render_report(&mut rendered, reportable) {
        error!("Failed to render report: {err}");
        return;
    }

    if reportable.is_error() {
        error!("{rendered}");
    } else {
        warn!("{rendered}");
    }
}

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    let handler = GraphicalReportHandler::new();
    if args.check {
        return check(&args, &handler);
    }

    let failed = match weft_cli::run(&args) {
        Ok(outcome) => {
            for reportable in outcome.reportables() {
                report(&handler, &reportable);
            }
            outcome.has_fatal()
        }
        Err(err) => {
            report_error(&handler, &err);
            true
        }
    };

    if failed {
        return ExitCode::FAILURE;
    }
    info!(output = args.output.as_str(); "Diagram written");
    ExitCode::SUCCESS
}

/// Prints the check result as TOML; fails unless the composition is valid.
fn check(args: &Args, handler: &GraphicalReportHandler) -> ExitCode {
    let outcome = match weft_cli::check(args) {
        Ok(outcome) => outcome,
        Err(err) => {
            report_error(handler, &err);
            return ExitCode::FAILURE;
        }
    };
    for reportable in outcome.reportables() {
        report(handler, &reportable);
    }

    match toml::to_string(&outcome.check().summary()) {
        Ok(summary) => print!("{summary}"),
        Err(err) => error!("Failed to format check result: {err}"),
    }
    if outcome.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report_error(handler: &GraphicalReportHandler, err: &WeftError) {
    for reportable in to_reportables(err) {
        report(handler, &reportable);
    }
}
