// src/process/command.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::info;

use crate::errors::{ProcwatchError, Result};
use crate::process::handle::TokioProcess;

/// What to start: a program, its arguments, an optional working directory,
/// and whether stderr should be folded into the captured stdout.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    redirect_error_to_output: bool,
}

impl ProcessCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            redirect_error_to_output: false,
        }
    }

    /// Run `script` through the platform shell (`sh -c` / `cmd /C`).
    pub fn shell(script: impl Into<OsString>) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(script)
        } else {
            Self::new("sh").arg("-c").arg(script)
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Capture stderr together with stdout, at the stdout log level.
    pub fn redirect_error_to_output(mut self, redirect: bool) -> Self {
        self.redirect_error_to_output = redirect;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn redirects_error_to_output(&self) -> bool {
        self.redirect_error_to_output
    }

    /// Default log label: the program's file name.
    pub fn label(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Spawn the process with both output channels piped and stdin closed.
    pub fn start(&self) -> Result<TokioProcess> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let child = spawn_with_retry(&mut command, &self.program)?;
        info!(
            program = ?self.program,
            pid = child.id(),
            redirect_error_to_output = self.redirect_error_to_output,
            "started process"
        );
        Ok(TokioProcess::new(child))
    }
}

/// Spawn, retrying briefly while the executable is still being written
/// ("text file busy").
///
/// Runs on the caller's thread, async callers included: `start` is
/// synchronous like `Command::spawn`. The backoff sleeps only after a busy
/// error, at most four times, about 30 ms in total.
fn spawn_with_retry(command: &mut Command, program: &Path) -> Result<Child> {
    let mut backoff = Duration::from_millis(2);
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) => {
                let is_busy = matches!(source.kind(), std::io::ErrorKind::ExecutableFileBusy)
                    || source.raw_os_error() == Some(26);
                if is_busy && attempt < 4 {
                    attempt += 1;
                    std::thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
                    continue;
                }
                return Err(ProcwatchError::Spawn {
                    program: program.to_path_buf(),
                    source,
                });
            }
        }
    }
}
