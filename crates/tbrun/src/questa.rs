//! Command vocabulary of Questa/ModelSim.

use crate::toolchain::Invocation;
use std::path::{Path, PathBuf};
use tbrun_metadata::Metadata;
use tbrun_path::{TestArea, TestPaths};

const WAVE_WINDOW: &str = ".main_pane.wave.interior.cs.body.pw.wf";

#[derive(Clone, Debug)]
pub struct Questa {
    vsim: String,
    vlog: String,
    root: PathBuf,
    compile_timeout: Option<std::time::Duration>,
    simulate_timeout: Option<std::time::Duration>,
    query_timeout: Option<std::time::Duration>,
    view_timeout: Option<std::time::Duration>,
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `path` as a single word of a `-do` script.
fn tcl_word(path: &Path) -> String {
    let mut ret = String::new();
    for c in path.to_string_lossy().chars() {
        if c.is_whitespace() || "{}[]$;\"\\".contains(c) {
            ret.push('\\');
        }
        ret.push(c);
    }
    ret
}

fn tcl_words(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|x| tcl_word(x))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Questa {
    pub fn new(metadata: &Metadata, area: &TestArea) -> Self {
        Self {
            vsim: metadata.tools.vsim.clone(),
            vlog: metadata.tools.vlog.clone(),
            root: area.root.clone(),
            compile_timeout: metadata.test.compile_timeout(),
            simulate_timeout: metadata.test.simulate_timeout(),
            query_timeout: metadata.test.query_timeout(),
            view_timeout: metadata.test.view_timeout(),
        }
    }

    pub fn vsim(&self) -> &str {
        &self.vsim
    }

    pub fn vlog(&self) -> &str {
        &self.vlog
    }

    /// Creates the work library and compiles `files` into it.
    pub fn create_and_compile(&self, paths: &TestPaths, files: &[PathBuf]) -> Invocation {
        let work = tcl_word(&paths.work);
        let script = format!(
            "vlib {work}; vlog +acc -work {work} -stats=none {}; quit -f;",
            tcl_words(files)
        );
        Invocation::new(&self.vsim)
            .arg("-c")
            .arg("-logfile")
            .path_arg(&paths.compile_log)
            .arg("-do")
            .arg(script)
            .current_dir(&self.root)
            .timeout(self.compile_timeout)
    }

    /// Compiles `files` into the existing work library.
    pub fn compile(&self, paths: &TestPaths, files: &[PathBuf]) -> Invocation {
        Invocation::new(&self.vlog)
            .arg("+acc")
            .arg("-logfile")
            .path_arg(&paths.compile_log)
            .arg("-work")
            .path_arg(&paths.work)
            .arg("-stats=none")
            .args(files.iter().map(|x| display(x)))
            .current_dir(&self.root)
            .timeout(self.compile_timeout)
    }

    /// Command-line run without waveform capture.
    pub fn batch_run(&self, paths: &TestPaths) -> Invocation {
        Invocation::new(&self.vsim)
            .arg("-c")
            .arg(paths.design_unit())
            .arg("-wlf")
            .path_arg(&paths.wave)
            .arg("-logfile")
            .path_arg(&paths.transcript_log)
            .arg("-do")
            .arg("run -all; log -flush /*; quit -f;")
            .current_dir(&self.root)
            .timeout(self.simulate_timeout)
    }

    /// GUI run adding `wave_command` signals and saving the wave window format.
    ///
    /// With `quit` the simulator exits after the run; otherwise it stays open
    /// for interactive debugging and no timeout applies.
    pub fn wave_run(&self, paths: &TestPaths, wave_command: &str, quit: bool) -> Invocation {
        let mut script = format!(
            "{wave_command} run -all; write format wave -window {WAVE_WINDOW} {}; log -flush /*;",
            tcl_word(&paths.wave_format)
        );
        if quit {
            script.push_str(" quit -f;");
        }
        Invocation::new(&self.vsim)
            .arg("-wlf")
            .path_arg(&paths.wave)
            .arg(paths.design_unit())
            .arg("-logfile")
            .path_arg(&paths.transcript_log)
            .arg("-voptargs=+acc")
            .arg("-do")
            .arg(script)
            .current_dir(&self.root)
            .timeout(if quit { self.simulate_timeout } else { None })
    }

    /// Lists signals under the testbench whose names start with `signal`.
    pub fn find_signals(&self, paths: &TestPaths, signal: &str) -> Invocation {
        Invocation::new(&self.vsim)
            .arg("-c")
            .arg(paths.design_unit())
            .arg("-do")
            .arg(format!(
                "find signals /{}/{signal}* -recursive; quit -f;",
                paths.test
            ))
            .current_dir(&self.root)
            .capture()
            .timeout(self.query_timeout)
    }

    /// Opens a saved waveform with its saved format.
    pub fn view(&self, paths: &TestPaths) -> Invocation {
        let waves = paths.wave.parent().unwrap_or(&self.root).to_path_buf();
        Invocation::new(&self.vsim)
            .arg("-view")
            .arg(format!("{}.wlf", paths.test))
            .arg("-do")
            .arg(format!("{}.do", paths.test))
            .current_dir(waves)
            .stdout(&paths.view_transcript)
            .timeout(self.view_timeout)
    }
}
