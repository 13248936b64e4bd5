//! Execution of one testbench.
//!
//! ```text
//! Resolving -> Compiling -> Running -> Classifying -> Done
//!                                                  -> Recovering (batch mode, error verdict)
//! ```
//!
//! Every stage returns a typed outcome. A failing stage ends only its own
//! testbench; deciding the process exit status is left to the orchestrator.

use crate::classifier::{classify, LogKind, LogVerdict};
use crate::context::{Mode, Session, TestContext};
use crate::report;
use crate::resolver::ResolvedFileList;
use crate::scheduler;
use crate::signals::obtain_wave_command;
use crate::toolchain::{Invocation, Toolchain};
use crate::RunnerError;
use log::debug;
use std::fmt;
use std::fs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Compiling,
    Running,
    Classifying,
    Recovering,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Stage::Resolving => "resolving",
            Stage::Compiling => "compiling",
            Stage::Running => "running",
            Stage::Classifying => "classifying",
            Stage::Recovering => "recovering",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub test: String,
    pub verdict: LogVerdict,
    /// Waveforms were captured by a re-run after the failure
    pub recovered: bool,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.verdict != LogVerdict::Error
    }
}

fn enter(ctx: &TestContext, stage: Stage) {
    debug!("{}: {stage}", ctx.test());
}

/// Moves simulator artifacts in `outputs/` to names of the program of `ctx`.
pub fn rename_artifacts<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
) -> Result<(), RunnerError> {
    for (from, to) in session.area.sim_artifacts(&ctx.program) {
        if from.exists() {
            debug!(
                "Renaming ({} -> {})",
                from.to_string_lossy(),
                to.to_string_lossy()
            );
            fs::rename(&from, &to)?;
        }
    }
    Ok(())
}

async fn simulate<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
    invocation: Invocation,
) -> Result<LogVerdict, RunnerError> {
    let test = ctx.test();
    let output = session.toolchain.execute(&invocation).await;
    let renamed = rename_artifacts(session, ctx);
    let output = output?;
    renamed?;

    if !output.success() {
        let error = output.into_error(session.questa.vsim());
        report::surface(
            test,
            session.verbose(),
            &format!("Running {test} failed with the following errors"),
            &format!("{error}. {}", session.log_hint('t', test)),
            &ctx.paths.transcript_log,
        );
        return Err(error);
    }

    enter(ctx, Stage::Classifying);
    classify(&ctx.paths.transcript_log, LogKind::Transcript)
}

async fn wave_invocation<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
    quit: bool,
) -> Result<Invocation, RunnerError> {
    let wave_command = obtain_wave_command(session, ctx).await?;
    Ok(session.questa.wave_run(&ctx.paths, &wave_command, quit))
}

fn recovery_allowed<T: Toolchain>(session: &Session<T>, files: &ResolvedFileList) -> bool {
    let test = &session.metadata.test;
    if !test.recovery {
        return false;
    }
    match test.recovery_max_source_bytes {
        Some(limit) => files.total_bytes() <= limit,
        None => true,
    }
}

async fn recover<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
) -> Result<LogVerdict, RunnerError> {
    let invocation = wave_invocation(session, ctx, true).await?;
    simulate(session, ctx, invocation).await
}

/// Compiles and runs the testbench `test` in the session's mode.
pub async fn execute<T: Toolchain>(
    session: &Session<T>,
    test: &str,
) -> Result<Outcome, RunnerError> {
    let mode = session.options.mode;
    if mode == Mode::View {
        return view(session, test).await;
    }

    let ctx = session.context(test);
    if !ctx.paths.source.exists() {
        return Err(RunnerError::TestbenchNotFound {
            test: test.to_string(),
            path: ctx.paths.source.clone(),
        });
    }

    enter(&ctx, Stage::Resolving);
    let files = session.resolver.resolve(&ctx.paths.source)?;
    debug!("{test}: {} file(s) to compile", files.len());

    enter(&ctx, Stage::Compiling);
    scheduler::compile(session, &ctx, files.files()).await?;

    enter(&ctx, Stage::Running);
    if session.verbose() {
        let line = match mode {
            Mode::Batch => "Running in command-line mode...",
            Mode::Capture => "Saving waveforms and logging to file...",
            _ => "Running in GUI mode...",
        };
        report::info(test, line);
    }
    let invocation = match mode {
        Mode::Batch => session.questa.batch_run(&ctx.paths),
        Mode::Capture => wave_invocation(session, &ctx, true).await?,
        _ => wave_invocation(session, &ctx, false).await?,
    };
    let verdict = simulate(session, &ctx, invocation).await?;

    let mut recovered = false;
    match verdict {
        LogVerdict::Success => report::info(test, "YAHOO!! All tests passed."),
        LogVerdict::Warning => report::warning(
            test,
            &format!("Test completed with warnings. {}", session.log_hint('t', test)),
        ),
        LogVerdict::Unknown => report::warning(
            test,
            &format!("Unknown status. {}", session.log_hint('t', test)),
        ),
        LogVerdict::Error if mode == Mode::Batch => {
            let allowed = recovery_allowed(session, &files);
            let suffix = if allowed {
                " Saving waveforms for later debug..."
            } else {
                ""
            };
            if session.verbose() {
                report::dump(
                    test,
                    &format!("Running {test} failed with the following errors"),
                    &ctx.paths.transcript_log,
                );
                report::error(test, &format!("Test failed.{suffix}"));
            } else {
                report::error(
                    test,
                    &format!("Test failed. {}{suffix}", session.log_hint('t', test)),
                );
            }

            if allowed {
                enter(&ctx, Stage::Recovering);
                recover(session, &ctx)
                    .await
                    .map_err(|source| RunnerError::RecoveryFailed {
                        test: test.to_string(),
                        source: Box::new(source),
                    })?;
                recovered = true;
            } else {
                debug!("{test}: recovery skipped");
            }
        }
        LogVerdict::Error => report::error(
            test,
            &format!("Test failed. {}", session.log_hint('t', test)),
        ),
    }

    Ok(Outcome {
        test: test.to_string(),
        verdict,
        recovered,
    })
}

/// Opens the saved waveforms of `test` without compiling or running anything.
pub async fn view<T: Toolchain>(session: &Session<T>, test: &str) -> Result<Outcome, RunnerError> {
    let ctx = session.context(test);
    if session.verbose() {
        report::info(test, "Viewing saved waveforms...");
    }

    let output = session
        .toolchain
        .execute(&session.questa.view(&ctx.paths))
        .await?;
    if !output.success() {
        let error = output.into_error(session.questa.vsim());
        report::surface(
            test,
            session.verbose(),
            &format!("Viewing waveforms for {test} failed with the following errors"),
            &error.to_string(),
            &ctx.paths.view_transcript,
        );
        return Err(error);
    }

    Ok(Outcome {
        test: test.to_string(),
        verdict: LogVerdict::Success,
        recovered: false,
    })
}
