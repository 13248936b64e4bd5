use crate::RunnerError;
use futures::prelude::*;
use log::{debug, log_enabled, Level};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::codec::{FramedRead, LinesCodec};

/// One call of an external tool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    /// File receiving stdout, truncated first
    pub stdout: Option<PathBuf>,
    /// Keep stdout in `ToolOutput::stdout`; otherwise it is only logged
    pub capture: bool,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new<T: Into<String>>(program: T) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Program and leading arguments from a configured command vector such as `["java", "-cp", "Scripts", "Vcheck"]`.
    pub fn from_command<T: AsRef<str>>(command: &[T]) -> Self {
        let mut iter = command.iter().map(|x| x.as_ref());
        let program = iter.next().unwrap_or_default();
        Self::new(program).args(iter)
    }

    pub fn arg<T: Into<String>>(mut self, arg: T) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg<T: AsRef<Path>>(self, arg: T) -> Self {
        self.arg(arg.as_ref().to_string_lossy())
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args.extend(args.into_iter().map(|x| x.into()));
        self
    }

    pub fn current_dir<T: AsRef<Path>>(mut self, dir: T) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdout<T: AsRef<Path>>(mut self, path: T) -> Self {
        self.stdout = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value following `flag`, e.g. the path after `-logfile`.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|x| x == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|x| x.as_str())
    }

    pub fn command_line(&self) -> String {
        let mut ret = self.program.clone();
        for arg in &self.args {
            ret.push(' ');
            if arg.contains(' ') {
                ret.push_str(&format!("'{arg}'"));
            } else {
                ret.push_str(arg);
            }
        }
        ret
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// None when the process was terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout, empty unless the invocation asked for it
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn into_error(self, tool: &str) -> RunnerError {
        RunnerError::ToolFailed {
            tool: tool.to_string(),
            code: self.code,
            stderr: self.stderr.trim().replace('\n', " "),
        }
    }
}

/// Executes external tools. Every call blocks the calling task until the tool exits or times out.
pub trait Toolchain: Send + Sync {
    fn execute(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<ToolOutput, RunnerError>> + Send;
}

/// Runs tools as child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessToolchain;

impl Toolchain for ProcessToolchain {
    async fn execute(&self, invocation: &Invocation) -> Result<ToolOutput, RunnerError> {
        let name = invocation.program.as_str();
        debug!("Executing ({})", invocation.command_line());

        let mut command = Command::new(name);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| RunnerError::ToolSpawn {
            tool: name.to_string(),
            source,
        })?;
        let stdout = child.stdout.take().ok_or_else(|| RunnerError::ToolSpawn {
            tool: name.to_string(),
            source: std::io::Error::other("stdout is not captured"),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| RunnerError::ToolSpawn {
            tool: name.to_string(),
            source: std::io::Error::other("stderr is not captured"),
        })?;

        let read_stdout = async {
            let mut sink = match &invocation.stdout {
                Some(path) => Some(tokio::fs::File::create(path).await?),
                None => None,
            };
            let mut captured = String::new();
            let mut reader = FramedRead::new(stdout, LinesCodec::new());
            while let Some(line) = reader.next().await {
                let line = line?;
                if log_enabled!(Level::Debug) {
                    debug!("{} : {}", name, line);
                }
                if let Some(file) = sink.as_mut() {
                    file.write_all(line.as_bytes()).await?;
                    file.write_all(b"\n").await?;
                } else if invocation.capture {
                    captured.push_str(&line);
                    captured.push('\n');
                }
            }
            if let Some(mut file) = sink {
                file.flush().await?;
            }
            Ok::<_, RunnerError>(captured)
        };

        let read_stderr = async {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await?;
            Ok::<_, RunnerError>(buf)
        };

        let run = async {
            let (stdout, stderr) = futures::try_join!(read_stdout, read_stderr)?;
            let status = child.wait().await?;
            Ok::<_, RunnerError>(ToolOutput {
                code: status.code(),
                stdout,
                stderr,
            })
        };

        let output = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(x) => x?,
                Err(_) => {
                    return Err(RunnerError::Timeout {
                        tool: name.to_string(),
                        seconds: limit.as_secs(),
                    })
                }
            },
            None => run.await?,
        };

        debug!("Finished ({}) with exit code {:?}", name, output.code);
        Ok(output)
    }
}

/// Checks that every program can be found before anything is dispatched.
pub fn check_tools<T: AsRef<str>>(programs: &[T]) -> Result<(), RunnerError> {
    for program in programs {
        let program = program.as_ref();
        if which::which(program).is_err() {
            return Err(RunnerError::ToolNotFound(program.to_string()));
        }
    }
    Ok(())
}
