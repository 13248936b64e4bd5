use crate::classifier::LogVerdict;
use crate::context::Session;
use crate::decision::DecisionProvider;
use crate::pipeline::{self, Outcome};
use crate::report;
use crate::toolchain::Toolchain;
use crate::RunnerError;
use log::{debug, error, info};
use std::sync::Arc;
use tbrun_path::TestArea;
use tokio::sync::Semaphore;

/// Testbenches to run: `name`, every one with `all`, the only one, or the one the decider picks.
pub fn select_testbenches(
    area: &TestArea,
    name: Option<&str>,
    all: bool,
    decider: &dyn DecisionProvider,
) -> Result<Vec<String>, RunnerError> {
    if let Some(name) = name {
        let name = name
            .strip_suffix(".sv")
            .or_else(|| name.strip_suffix(".v"))
            .unwrap_or(name);
        let paths = area.paths(name);
        if !paths.source.exists() {
            return Err(RunnerError::TestbenchNotFound {
                test: name.to_string(),
                path: paths.source,
            });
        }
        return Ok(vec![name.to_string()]);
    }

    let candidates = area.testbenches()?;
    if candidates.is_empty() {
        return Err(RunnerError::NoTestbench(area.tests.clone()));
    }
    if all || candidates.len() == 1 {
        return Ok(candidates);
    }
    match decider.choose_testbench(&candidates)? {
        Some(x) => Ok(vec![x]),
        None => Err(RunnerError::TestbenchNotChosen(candidates)),
    }
}

#[derive(Debug, Default)]
pub struct Summary {
    pub outcomes: Vec<Outcome>,
    pub errors: Vec<(String, RunnerError)>,
}

impl Summary {
    fn count(&self, verdict: LogVerdict) -> usize {
        self.outcomes.iter().filter(|x| x.verdict == verdict).count()
    }

    pub fn passed(&self) -> usize {
        self.count(LogVerdict::Success)
    }

    pub fn warned(&self) -> usize {
        self.count(LogVerdict::Warning)
    }

    pub fn unknown(&self) -> usize {
        self.count(LogVerdict::Unknown)
    }

    /// Error verdicts plus testbenches that ended with an error.
    pub fn failed(&self) -> usize {
        self.count(LogVerdict::Error) + self.errors.len()
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, test: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|x| x.test == test)
    }

    pub fn error(&self, test: &str) -> Option<&RunnerError> {
        self.errors
            .iter()
            .find(|(x, _)| x == test)
            .map(|(_, x)| x)
    }

    pub fn report(&self) {
        let line = format!(
            "Completed tests : {} passed, {} warned, {} unknown, {} failed",
            self.passed(),
            self.warned(),
            self.unknown(),
            self.failed()
        );
        if self.success() {
            info!("{line}");
        } else {
            error!("{line}");
        }
    }
}

/// Runs every test on its own task, at most `jobs` at once, and waits for all of them.
///
/// A failing test never cancels the others.
pub async fn run_all<T: Toolchain + 'static>(session: Arc<Session<T>>, tests: Vec<String>) -> Summary {
    let jobs = session.metadata.jobs().max(1);
    debug!("Dispatching {} test(s) on {jobs} job(s)", tests.len());
    let semaphore = Arc::new(Semaphore::new(jobs));

    let mut handles = Vec::new();
    for test in tests {
        let session = session.clone();
        let semaphore = semaphore.clone();
        let name = test.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|x| RunnerError::Task {
                    test: test.clone(),
                    message: x.to_string(),
                })?;
            pipeline::execute(&session, &test).await
        });
        handles.push((name, handle));
    }

    let mut summary = Summary::default();
    for (test, handle) in handles {
        let result = match handle.await {
            Ok(x) => x,
            Err(x) => Err(RunnerError::Task {
                test: test.clone(),
                message: x.to_string(),
            }),
        };
        match result {
            Ok(x) => summary.outcomes.push(x),
            Err(x) => {
                report::error(&test, &x.to_string());
                summary.errors.push((test, x));
            }
        }
    }
    summary
}
