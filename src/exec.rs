//! External command execution.
//!
//! A small builder over [`std::process::Command`] used for transformation
//! steps (document piped through stdin, result read from stdout) and for
//! publish commands (terminal inherited, so tools can prompt themselves).
//!
//! ```ignore
//! let out = Cmd::new("xsltproc").args([stylesheet, "-"]).stdin(doc).run()?;
//! let status = Cmd::new("rsync").args(["-av", "build/", "host:www/"]).status()?;
//! ```

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::process::{Command, ExitStatus, Output, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("failed to write stdin of `{program}`: {source}")]
    Stdin {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}{}", format_stderr(.stderr))]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array; the first element is the program.
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        Self {
            program,
            args: iter.map(|s| s.as_ref().to_owned()).collect(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Data piped to the process's stdin.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run with captured output. A non-zero exit is an error carrying stderr.
    pub fn run(self) -> Result<Output, ExecError> {
        let program = self.program_name();
        let mut cmd = self.command();
        cmd.stdin(if self.stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Feed stdin from a separate thread so a child that writes before it
        // has read all input cannot block on a full stdout pipe.
        let feeder = match (self.stdin_data, child.stdin.take()) {
            (Some(data), Some(mut stdin)) => {
                Some(std::thread::spawn(move || stdin.write_all(&data)))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ExecError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        if let Some(Ok(Err(source))) = feeder.map(|f| f.join()) {
            return Err(ExecError::Stdin { program, source });
        }
        Ok(output)
    }

    /// Run attached to the terminal and return the exit status.
    pub fn status(self) -> Result<ExitStatus, ExecError> {
        let program = self.program_name();
        self.command()
            .status()
            .map_err(|source| ExecError::Spawn { program, source })
    }
}
