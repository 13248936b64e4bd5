use clap::Parser;
use console::Style;
use fern::Dispatch;
use log::debug;
use log::{Level, LevelFilter};
use miette::{IntoDiagnostic, Result};
use std::process::ExitCode;
use std::time::Instant;
use tbrun_metadata::Metadata;

use tbrun::*;

// ---------------------------------------------------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let opt = Opt::parse();

    let level = if opt.verbose {
        LevelFilter::Debug
    } else if opt.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    Dispatch::new()
        .format(|out, message, record| {
            let style = match record.level() {
                Level::Error => Style::new().red().bright(),
                Level::Warn => Style::new().yellow().bright(),
                Level::Info => Style::new().green().bright(),
                Level::Debug => Style::new().cyan().bright(),
                Level::Trace => Style::new().magenta().bright(),
            };
            let message = format!("{message}");
            let head = message.split_ascii_whitespace().next().unwrap_or("").len();
            out.finish(format_args!(
                "{} {}{}",
                style.apply_to(format!("[{:<5}]", record.level())),
                " ".repeat(12usize.saturating_sub(head)),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .into_diagnostic()?;

    let metadata = Metadata::load_or_default()?;

    let now = Instant::now();

    let ret = match opt.command {
        Commands::Test(x) => cmd_test::CmdTest::new(x).exec(&metadata)?,
        Commands::Check(x) => cmd_check::CmdCheck::new(x).exec(&metadata)?,
        Commands::Log(x) => cmd_log::CmdLog::new(x).exec()?,
    };

    let elapsed_time = now.elapsed();
    debug!("Elapsed time ({} milliseconds)", elapsed_time.as_millis());

    if ret {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
