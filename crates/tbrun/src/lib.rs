use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod assembler;
pub mod classifier;
pub mod cmd_check;
pub mod cmd_log;
pub mod context;
pub mod decision;
pub mod linter;
pub mod orchestrator;
pub mod pipeline;
pub mod questa;
pub mod report;
pub mod resolver;
pub mod runner_error;
pub mod scheduler;
pub mod signals;
pub mod toolchain;

pub use runner_error::RunnerError;


// ---------------------------------------------------------------------------------------------------------------------
// Opt
// ---------------------------------------------------------------------------------------------------------------------

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Opt {
    /// No output printed to stdout
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Use verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Test(OptTest),
    Check(OptCheck),
    Log(OptLog),
}

/// Compile and run testbenches of a test area
#[derive(Args)]
pub struct OptTest {
    /// Test area containing "designs" and "tests" (e.g. Phase-1)
    pub area: PathBuf,

    /// Testbench name without extension (e.g. alu_tb)
    pub test: Option<String>,

    /// Execution mode: 0=command-line, 1=save waves, 2=GUI, 3=view saved waves
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub mode: u8,

    /// Run all testbenches of the area in parallel
    #[arg(short, long)]
    pub all: bool,

    /// Assemble this program into the instruction image before running
    #[arg(long)]
    pub asm: Option<PathBuf>,
}

/// Check design files of a test area with the design linter
#[derive(Args)]
pub struct OptCheck {
    /// Test area containing "designs"
    pub area: PathBuf,
}

/// Display a transcript or compilation log
#[derive(Args)]
pub struct OptLog {
    /// Test area containing "tests"
    pub area: PathBuf,

    /// Log kind
    #[arg(value_enum)]
    pub kind: LogKind,

    /// Testbench name without extension
    pub test: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogKind {
    /// Simulation transcript
    #[value(alias = "t")]
    Transcript,
    /// Compilation log
    #[value(alias = "c")]
    Compilation,
}

impl From<LogKind> for classifier::LogKind {
    fn from(x: LogKind) -> Self {
        match x {
            LogKind::Transcript => classifier::LogKind::Transcript,
            LogKind::Compilation => classifier::LogKind::Compilation,
        }
    }
}
