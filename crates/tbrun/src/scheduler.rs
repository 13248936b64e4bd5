//! Incremental compilation into per-testbench work libraries.

use crate::classifier::{classify, LogKind, LogVerdict};
use crate::context::{Session, TestContext};
use crate::report;
use crate::toolchain::Toolchain;
use crate::RunnerError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileAction {
    /// Nothing changed since the last compilation
    UpToDate,
    /// The work library doesn't exist: create it and compile these files
    Create(Vec<PathBuf>),
    /// Compile these files into the existing work library
    Update(Vec<PathBuf>),
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|x| x.modified()).ok()
}

/// Files needing recompilation given the previous compilation log.
///
/// Everything is stale when there is no log or the log records an error.
/// Otherwise a file is stale when it was modified strictly after the log.
pub fn stale_files(compile_log: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, RunnerError> {
    let Some(log_time) = modified(compile_log) else {
        return Ok(files.to_vec());
    };
    if classify(compile_log, LogKind::Compilation)? == LogVerdict::Error {
        return Ok(files.to_vec());
    }

    Ok(files
        .iter()
        .filter(|x| match modified(x) {
            Some(time) => time > log_time,
            None => true,
        })
        .cloned()
        .collect())
}

pub fn plan(ctx: &TestContext, files: &[PathBuf]) -> Result<CompileAction, RunnerError> {
    let stale = stale_files(&ctx.paths.compile_log, files)?;
    if stale.is_empty() {
        Ok(CompileAction::UpToDate)
    } else if !ctx.paths.work.is_dir() {
        Ok(CompileAction::Create(files.to_vec()))
    } else {
        Ok(CompileAction::Update(stale))
    }
}

/// Brings the work library of `ctx` up to date with `files`.
///
/// Fails when the compiler exits abnormally or its log records an error.
pub async fn compile<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
    files: &[PathBuf],
) -> Result<CompileAction, RunnerError> {
    let test = ctx.test();
    let action = plan(ctx, files)?;
    let (invocation, tool, count) = match &action {
        CompileAction::UpToDate => {
            debug!("{test}: work library is up to date");
            return Ok(action);
        }
        CompileAction::Create(x) => (
            session.questa.create_and_compile(&ctx.paths, x),
            session.questa.vsim(),
            x.len(),
        ),
        CompileAction::Update(x) => (
            session.questa.compile(&ctx.paths, x),
            session.questa.vlog(),
            x.len(),
        ),
    };
    debug!("{test}: compiling {count} file(s)");

    let output = session.toolchain.execute(&invocation).await?;
    if !output.success() {
        let error = output.into_error(tool);
        report::surface(
            test,
            session.verbose(),
            "Compilation failed with the following errors",
            &format!("{error}. {}", session.log_hint('c', test)),
            &ctx.paths.compile_log,
        );
        return Err(error);
    }

    match classify(&ctx.paths.compile_log, LogKind::Compilation)? {
        LogVerdict::Warning => report::warning(
            test,
            &format!(
                "Compilation completed with warnings. {}",
                session.log_hint('c', test)
            ),
        ),
        LogVerdict::Error => {
            report::surface(
                test,
                session.verbose(),
                "Compilation failed with the following errors",
                &format!("Compilation has errors. {}", session.log_hint('c', test)),
                &ctx.paths.compile_log,
            );
            return Err(RunnerError::CompileFailed {
                test: test.to_string(),
                log: ctx.paths.compile_log.clone(),
            });
        }
        _ => (),
    }
    Ok(action)
}
