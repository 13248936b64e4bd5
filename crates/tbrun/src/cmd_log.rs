use crate::classifier::{classify, LogKind};
use crate::{OptLog, RunnerError};
use console::style;
use log::{info, warn};
use miette::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tbrun_path::{PathError, TestArea};

pub struct CmdLog {
    opt: OptLog,
}

fn log_dir(area: &TestArea, kind: LogKind) -> &PathBuf {
    match kind {
        LogKind::Transcript => &area.transcripts,
        LogKind::Compilation => &area.compilations,
    }
}

fn log_path(area: &TestArea, kind: LogKind, test: &str) -> PathBuf {
    let paths = area.paths(test);
    match kind {
        LogKind::Transcript => paths.transcript_log,
        LogKind::Compilation => paths.compile_log,
    }
}

/// Logs of `kind` present in `area`, sorted.
pub fn available_logs(area: &TestArea, kind: LogKind) -> Result<Vec<PathBuf>, PathError> {
    let dir = log_dir(area, kind);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut ret = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|x| x == "log").unwrap_or(false) {
            ret.push(path);
        }
    }
    ret.sort();
    Ok(ret)
}

impl CmdLog {
    pub fn new(opt: OptLog) -> Self {
        Self { opt }
    }

    pub fn exec(&self) -> Result<bool> {
        let area = TestArea::open(&self.opt.area)?;
        let kind: LogKind = self.opt.kind.into();
        let name = match kind {
            LogKind::Transcript => "transcript",
            LogKind::Compilation => "compilation",
        };

        if let Some(test) = &self.opt.test {
            let path = log_path(&area, kind, test);
            if !path.is_file() {
                return Err(RunnerError::ReadFile {
                    path,
                    source: std::io::ErrorKind::NotFound.into(),
                }
                .into());
            }
            display(&path, kind)?;
            return Ok(true);
        }

        let logs = available_logs(&area, kind)?;
        match logs.as_slice() {
            [] => warn!(
                "No {name} log files found in {}",
                log_dir(&area, kind).to_string_lossy()
            ),
            [x] => display(x, kind)?,
            _ => {
                info!("Available {name} logs");
                for (i, x) in logs.iter().enumerate() {
                    let file = x
                        .file_name()
                        .map(|x| x.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    println!("{:>3}: {file}", i + 1);
                }
            }
        }
        Ok(true)
    }
}

fn display(path: &Path, kind: LogKind) -> Result<(), RunnerError> {
    let verdict = classify(path, kind)?;
    let text = fs::read(path).map_err(|source| RunnerError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file = path
        .file_name()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!(
        "{}",
        style(format!("=== Displaying {file} ({verdict}) ===")).bold()
    );
    println!("{}", String::from_utf8_lossy(&text));
    Ok(())
}
