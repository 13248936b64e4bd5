//! Signal selection for waveform capture.
//!
//! Short names are resolved to hierarchy paths by asking the simulator, and
//! the resulting `add wave` commands are cached per testbench.

use crate::context::{Session, TestContext};
use crate::report;
use crate::toolchain::Toolchain;
use crate::RunnerError;
use log::debug;
use std::fs;

const SEPARATOR: char = '/';
const IGNORED: [&str; 2] = ["//", "-access/-debug"];

/// First path in `find signals` output whose last segment is exactly `signal`.
pub fn parse_find_output(stdout: &str, signal: &str) -> Option<String> {
    stdout
        .split_whitespace()
        .filter(|x| !x.starts_with('#') && !IGNORED.contains(x))
        .filter(|x| x.contains(SEPARATOR))
        .find(|x| x.rsplit(SEPARATOR).next() == Some(signal))
        .map(|x| x.to_string())
}

/// Resolves `names` to hierarchy paths of the design under `ctx`.
///
/// Names containing a separator pass through unchanged. Names nothing matches are dropped.
pub async fn resolve_signals<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
    names: &[String],
) -> Result<Vec<String>, RunnerError> {
    let mut ret = Vec::new();
    for name in names {
        if name.contains(SEPARATOR) {
            ret.push(name.clone());
            continue;
        }

        let invocation = session.questa.find_signals(&ctx.paths, name);
        let output = session.toolchain.execute(&invocation).await?;
        match parse_find_output(&output.stdout, name) {
            Some(x) => {
                debug!("{}: signal {name} is {x}", ctx.test());
                if !ret.contains(&x) {
                    ret.push(x);
                }
            }
            None => report::warning(ctx.test(), &format!("Signal {name} is not found")),
        }
    }
    Ok(ret)
}

/// Single-line simulator command adding every path to the wave window.
pub fn wave_command<T: AsRef<str>>(paths: &[T]) -> String {
    paths
        .iter()
        .map(|x| format!("add wave {};", x.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wave command of `ctx`, from its cache when allowed, otherwise from a fresh selection.
pub async fn obtain_wave_command<T: Toolchain>(
    session: &Session<T>,
    ctx: &TestContext,
) -> Result<String, RunnerError> {
    let test = ctx.test();
    let cache = &ctx.paths.wave_command;

    if cache.exists() {
        let existing = fs::read_to_string(cache)
            .map_err(|source| RunnerError::ReadFile {
                path: cache.clone(),
                source,
            })?
            .trim()
            .to_string();
        if session.options.all || session.decider.reuse_wave_command(test, &existing)? {
            debug!("{test}: reusing wave command ({})", cache.to_string_lossy());
            return Ok(existing);
        }
    }

    let names = session.decider.select_signals(test)?;
    let paths = resolve_signals(session, ctx, &names).await?;
    if paths.is_empty() {
        return Err(RunnerError::NoSignals {
            test: test.to_string(),
        });
    }

    let command = wave_command(&paths);
    fs::write(cache, &command)?;
    debug!("{test}: saved wave command ({})", cache.to_string_lossy());
    Ok(command)
}
