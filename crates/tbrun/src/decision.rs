use crate::RunnerError;
use console::{style, Term};

/// Answers the questions a run may need a human for.
pub trait DecisionProvider: Send + Sync {
    /// Picks one of several testbenches, `None` when nobody can decide.
    fn choose_testbench(&self, candidates: &[String]) -> Result<Option<String>, RunnerError>;

    /// Whether the saved wave command `existing` of `test` should be used again.
    fn reuse_wave_command(&self, test: &str, existing: &str) -> Result<bool, RunnerError>;

    /// Short or hierarchical names of the signals to capture for `test`.
    fn select_signals(&self, test: &str) -> Result<Vec<String>, RunnerError>;
}

/// Asks on the terminal.
#[derive(Clone, Debug)]
pub struct ConsoleDecider {
    term: Term,
}

impl Default for ConsoleDecider {
    fn default() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl ConsoleDecider {
    pub fn new() -> Self {
        Self::default()
    }

    fn ask(&self, prompt: &str) -> Result<String, RunnerError> {
        self.term.write_str(prompt)?;
        self.term.flush()?;
        Ok(self.term.read_line()?.trim().to_string())
    }
}

impl DecisionProvider for ConsoleDecider {
    fn choose_testbench(&self, candidates: &[String]) -> Result<Option<String>, RunnerError> {
        self.term
            .write_line("Multiple testbench files found. Please choose one:")?;
        for (i, x) in candidates.iter().enumerate() {
            self.term
                .write_line(&format!("  {}. {}", style(i + 1).bold(), x))?;
        }

        loop {
            let answer = self.ask("Enter the number corresponding to your choice: ")?;
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(x) if (1..=candidates.len()).contains(&x) => {
                    return Ok(Some(candidates[x - 1].clone()));
                }
                Ok(_) => self.term.write_line(&format!(
                    "Invalid choice. Please select a number between 1 and {}.",
                    candidates.len()
                ))?,
                Err(_) => {
                    if let Some(x) = candidates.iter().find(|x| **x == answer) {
                        return Ok(Some(x.clone()));
                    }
                    self.term
                        .write_line("Invalid input. Please enter a number.")?
                }
            }
        }
    }

    fn reuse_wave_command(&self, test: &str, existing: &str) -> Result<bool, RunnerError> {
        self.term.write_line(&format!(
            "{test}: Wave command file already exists: {}",
            style(existing).dim()
        ))?;
        let answer = self.ask("Would you like to use the existing signals? (y/n): ")?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }

    fn select_signals(&self, test: &str) -> Result<Vec<String>, RunnerError> {
        self.term.write_line(&format!(
            "{test}: Please enter the signals to add (comma-separated):"
        ))?;
        let answer = self.ask("Signals: ")?;
        Ok(split_signals(&answer))
    }
}

pub fn split_signals(text: &str) -> Vec<String> {
    text.split(',')
        .map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .map(|x| x.to_string())
        .collect()
}

/// Fixed answers for unattended runs.
#[derive(Clone, Debug, Default)]
pub struct CannedDecider {
    pub signals: Vec<String>,
    pub reuse: bool,
    pub choice: Option<String>,
}

impl CannedDecider {
    /// Reuses every cache and falls back to `signals` when none exists.
    pub fn new(signals: Vec<String>) -> Self {
        Self {
            signals,
            reuse: true,
            choice: None,
        }
    }
}

impl DecisionProvider for CannedDecider {
    fn choose_testbench(&self, candidates: &[String]) -> Result<Option<String>, RunnerError> {
        Ok(self
            .choice
            .as_ref()
            .filter(|x| candidates.contains(x))
            .cloned())
    }

    fn reuse_wave_command(&self, _test: &str, _existing: &str) -> Result<bool, RunnerError> {
        Ok(self.reuse)
    }

    fn select_signals(&self, _test: &str) -> Result<Vec<String>, RunnerError> {
        Ok(self.signals.clone())
    }
}
