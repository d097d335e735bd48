// src/process/result.rs

/// Outcome of a finished process: exit code plus both captured texts.
///
/// Built once, after the process exited and the monitors were waited for.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl ProcessResult {
    pub fn new(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn into_stdout(self) -> String {
        self.stdout
    }
}
