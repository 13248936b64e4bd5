use crate::toolchain::{Invocation, Toolchain};
use crate::RunnerError;
use log::debug;
use std::path::PathBuf;
use tbrun_metadata::Metadata;
use tbrun_path::TestArea;

/// Design file the linter rejected, with what it printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LintReport {
    pub checked: usize,
    pub violations: Vec<Violation>,
}

impl LintReport {
    pub fn compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Runs the linter on every design file of `area`.
///
/// A file is compliant when the linter output starts with the configured marker.
/// A linter exiting abnormally aborts the check.
pub async fn lint<T: Toolchain>(
    toolchain: &T,
    metadata: &Metadata,
    area: &TestArea,
) -> Result<LintReport, RunnerError> {
    let mut ret = LintReport::default();
    let marker = metadata.tools.linter_marker.as_str();

    for path in area.design_files()? {
        let invocation = Invocation::from_command(&metadata.tools.linter)
            .path_arg(&path)
            .current_dir(metadata.base_dir())
            .capture()
            .timeout(metadata.test.compile_timeout());
        let output = toolchain.execute(&invocation).await?;
        if !output.success() {
            return Err(output.into_error(&invocation.program));
        }

        ret.checked += 1;
        let message = output.stdout.trim();
        if message.starts_with(marker) {
            debug!("Compliant ({})", path.to_string_lossy());
        } else {
            ret.violations.push(Violation {
                path,
                message: message.to_string(),
            });
        }
    }
    Ok(ret)
}
