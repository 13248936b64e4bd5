use crate::decision::DecisionProvider;
use crate::questa::Questa;
use crate::resolver::Resolver;
use crate::toolchain::Toolchain;
use std::fmt;
use tbrun_metadata::Metadata;
use tbrun_path::{TestArea, TestPaths};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Command-line run, no waveform capture
    #[default]
    Batch,
    /// Run once capturing waveforms, then quit
    Capture,
    /// Interactive GUI run
    Gui,
    /// Replay saved waveforms, nothing is compiled or run
    View,
}

impl TryFrom<u8> for Mode {
    type Error = u8;

    fn try_from(x: u8) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(Mode::Batch),
            1 => Ok(Mode::Capture),
            2 => Ok(Mode::Gui),
            3 => Ok(Mode::View),
            x => Err(x),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Mode::Batch => "command-line",
            Mode::Capture => "saving",
            Mode::Gui => "GUI",
            Mode::View => "view",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub mode: Mode,
    /// Several testbenches run at once: no prompts, no multi-line dumps
    pub all: bool,
    /// Stem of the assembled program, if an assembly step ran
    pub program: Option<String>,
}

/// Everything fixed for one invocation, shared read-only by every task.
pub struct Session<T: Toolchain> {
    pub area: TestArea,
    pub metadata: Metadata,
    pub options: RunOptions,
    pub questa: Questa,
    pub resolver: Resolver,
    pub toolchain: T,
    pub decider: Box<dyn DecisionProvider>,
}

impl<T: Toolchain> Session<T> {
    pub fn new(
        area: TestArea,
        metadata: Metadata,
        options: RunOptions,
        toolchain: T,
        decider: Box<dyn DecisionProvider>,
    ) -> Self {
        let questa = Questa::new(&metadata, &area);
        let resolver = Resolver::new(&area);
        Self {
            area,
            metadata,
            options,
            questa,
            resolver,
            toolchain,
            decider,
        }
    }

    /// Paths and program identity of `test`.
    ///
    /// When several testbenches run the same program, the identity also
    /// carries the testbench name so that no two tasks rename into one file.
    pub fn context(&self, test: &str) -> TestContext {
        let program = match &self.options.program {
            Some(x) if self.options.all => format!("{x}_{test}"),
            Some(x) => x.clone(),
            None => test.to_string(),
        };
        TestContext {
            paths: self.area.paths(test),
            program,
        }
    }

    /// Whether failures may be dumped in full.
    pub fn verbose(&self) -> bool {
        !self.options.all
    }

    pub fn log_hint(&self, kind: char, test: &str) -> String {
        format!(
            "Run 'tbrun log {} {kind} {test}' for details.",
            self.area.root.to_string_lossy()
        )
    }
}

/// Per-testbench paths and the program its artifacts are named after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestContext {
    pub paths: TestPaths,
    pub program: String,
}

impl TestContext {
    pub fn test(&self) -> &str {
        &self.paths.test
    }
}
