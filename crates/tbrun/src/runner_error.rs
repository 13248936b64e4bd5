use miette::{self, Diagnostic};
use std::path::PathBuf;
use tbrun_path::PathError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RunnerError {
    #[diagnostic(code(RunnerError::FileIO), help(""))]
    #[error("file I/O error")]
    FileIO(#[from] std::io::Error),

    #[diagnostic(code(RunnerError::ReadFile), help(""))]
    #[error("failed to read \"{}\"", .path.to_string_lossy())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[diagnostic(transparent)]
    #[error(transparent)]
    Path(#[from] PathError),

    #[diagnostic(
        code(RunnerError::NoTestbench),
        help("testbench files end with \"_tb.sv\" or \"_tb.v\"")
    )]
    #[error("no testbench found in \"{}\"", .0.to_string_lossy())]
    NoTestbench(PathBuf),

    #[diagnostic(code(RunnerError::TestbenchNotFound), help(""))]
    #[error("testbench \"{test}\" is not found at \"{}\"", .path.to_string_lossy())]
    TestbenchNotFound { test: String, path: PathBuf },

    #[diagnostic(
        code(RunnerError::TestbenchNotChosen),
        help("pass one of them as argument, or use --all")
    )]
    #[error("multiple testbenches found: {}", .0.join(", "))]
    TestbenchNotChosen(Vec<String>),

    #[diagnostic(code(RunnerError::ProgramNotFound), help(""))]
    #[error("program \"{}\" is not found", .0.to_string_lossy())]
    ProgramNotFound(PathBuf),

    #[diagnostic(code(RunnerError::ToolNotFound), help("check PATH or [tools] of Tbrun.toml"))]
    #[error("\"{0}\" is not found")]
    ToolNotFound(String),

    #[diagnostic(code(RunnerError::ToolSpawn), help(""))]
    #[error("failed to run \"{tool}\"")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[diagnostic(code(RunnerError::ToolFailed), help(""))]
    #[error("\"{tool}\" failed with exit code {}: {stderr}", .code.map(|x| x.to_string()).unwrap_or_else(|| "none".to_string()))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[diagnostic(code(RunnerError::Timeout), help("raise the timeout in [test] of Tbrun.toml"))]
    #[error("\"{tool}\" did not finish within {seconds} seconds")]
    Timeout { tool: String, seconds: u64 },

    #[diagnostic(code(RunnerError::ToolOutput), help(""))]
    #[error("failed to read tool output")]
    ToolOutput(#[from] tokio_util::codec::LinesCodecError),

    #[diagnostic(code(RunnerError::CompileFailed), help(""))]
    #[error("{test}: compilation has errors, see \"{}\"", .log.to_string_lossy())]
    CompileFailed { test: String, log: PathBuf },

    #[diagnostic(code(RunnerError::NoSignals), help("signals are matched by their last path segment"))]
    #[error("{test}: no signals found")]
    NoSignals { test: String },

    #[diagnostic(code(RunnerError::RecoveryFailed), help(""))]
    #[error("{test}: waveform capture after failure did not complete")]
    RecoveryFailed {
        test: String,
        #[source]
        source: Box<RunnerError>,
    },

    #[diagnostic(code(RunnerError::Task), help(""))]
    #[error("task of \"{test}\" aborted: {message}")]
    Task { test: String, message: String },
}
