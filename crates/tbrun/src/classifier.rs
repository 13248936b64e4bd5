//! Log classification.
//!
//! The verdict of a compilation or a simulation is read from the text the tools
//! and testbenches print, never from exit codes. Matching is plain substring
//! search with a fixed precedence:
//!
//! * compilation: `Error:` > `Warning:` > success
//! * transcript: `ERROR`/`FAIL` > success marker > `Warning:` > unknown

use crate::RunnerError;
use std::fmt;
use std::fs;
use std::path::Path;

/// Tokens testbenches print when every check passed.
pub const SUCCESS_MARKERS: [&str; 2] = ["YAHOO!!", "YIPPEE"];

const COMPILE_ERROR: &str = "Error:";
const WARNING: &str = "Warning:";
const TRANSCRIPT_ERRORS: [&str; 2] = ["ERROR", "FAIL"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    Compilation,
    Transcript,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogVerdict {
    Success,
    Warning,
    Error,
    /// No recognized marker, transcripts only
    Unknown,
}

impl fmt::Display for LogVerdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            LogVerdict::Success => "success",
            LogVerdict::Warning => "warning",
            LogVerdict::Error => "error",
            LogVerdict::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

pub fn classify<T: AsRef<Path>>(path: T, kind: LogKind) -> Result<LogVerdict, RunnerError> {
    let path = path.as_ref();
    let text = fs::read(path).map_err(|source| RunnerError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(classify_text(&String::from_utf8_lossy(&text), kind))
}

pub fn classify_text(text: &str, kind: LogKind) -> LogVerdict {
    match kind {
        LogKind::Compilation => {
            if text.contains(COMPILE_ERROR) {
                LogVerdict::Error
            } else if text.contains(WARNING) {
                LogVerdict::Warning
            } else {
                LogVerdict::Success
            }
        }
        LogKind::Transcript => {
            if TRANSCRIPT_ERRORS.iter().any(|x| text.contains(x)) {
                LogVerdict::Error
            } else if SUCCESS_MARKERS.iter().any(|x| text.contains(x)) {
                LogVerdict::Success
            } else if text.contains(WARNING) {
                LogVerdict::Warning
            } else {
                LogVerdict::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation() {
        let kind = LogKind::Compilation;
        assert_eq!(classify_text("", kind), LogVerdict::Success);
        assert_eq!(
            classify_text("-- Compiling module alu\n", kind),
            LogVerdict::Success
        );
        assert_eq!(
            classify_text("** Warning: alu.v(3): implicit net\n", kind),
            LogVerdict::Warning
        );
        assert_eq!(
            classify_text("** Warning: x\n** Error: alu.v(4): syntax\n", kind),
            LogVerdict::Error
        );
    }

    #[test]
    fn transcript() {
        let kind = LogKind::Transcript;
        assert_eq!(classify_text("", kind), LogVerdict::Unknown);
        assert_eq!(
            classify_text("# run -all\n# $finish\n", kind),
            LogVerdict::Unknown
        );
        assert_eq!(
            classify_text("# YAHOO!! All tests passed.\n", kind),
            LogVerdict::Success
        );
        assert_eq!(classify_text("# YIPPEE\n", kind), LogVerdict::Success);
        assert_eq!(
            classify_text("# ** Warning: (vsim-3015) port size\n", kind),
            LogVerdict::Warning
        );
        assert_eq!(
            classify_text("# ERROR: mismatch at 0x10\n", kind),
            LogVerdict::Error
        );
        assert_eq!(classify_text("# Test FAILED\n", kind), LogVerdict::Error);
    }

    #[test]
    fn error_takes_precedence_over_success() {
        let text = "# YAHOO!! All tests passed.\n# ERROR: late mismatch\n";
        assert_eq!(classify_text(text, LogKind::Transcript), LogVerdict::Error);

        let text = "# ** Warning: x\n# YAHOO!! All tests passed.\n";
        assert_eq!(classify_text(text, LogKind::Transcript), LogVerdict::Success);
    }

    #[test]
    fn compilation_ignores_transcript_vocabulary() {
        let text = "# YAHOO!! ERROR FAIL\n";
        assert_eq!(classify_text(text, LogKind::Compilation), LogVerdict::Success);
    }

    #[test]
    fn classify_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let log = tempdir.path().join("alu_tb_transcript.log");
        std::fs::write(&log, "# YAHOO!! All tests passed.\n").unwrap();
        assert_eq!(
            classify(&log, LogKind::Transcript).unwrap(),
            LogVerdict::Success
        );

        let missing = tempdir.path().join("missing.log");
        assert!(matches!(
            classify(missing, LogKind::Compilation),
            Err(RunnerError::ReadFile { .. })
        ));
    }
}
