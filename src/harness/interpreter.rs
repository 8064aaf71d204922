//! Execution adapter around the code interpreter service.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::HarnessError;

/// Captured result of one execution.
///
/// A program that raises is not an error: the trace lands in `fault` and the
/// harness reports it as the example's actual output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    pub stdout: String,
    pub stderr: String,
    pub fault: Option<String>,
}

impl Execution {
    /// Everything the harness inspects: stdout, then the fault trace if any.
    pub fn output_text(&self) -> String {
        match &self.fault {
            Some(fault) if self.stdout.trim().is_empty() => fault.clone(),
            Some(fault) => format!("{}\n{}", self.stdout.trim_end(), fault),
            None => self.stdout.clone(),
        }
    }
}

/// A code interpreter.
///
/// `Err` is reserved for transport failures (the interpreter could not be
/// reached at all); those are worth a reset and a retry.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn execute(&self, code: &str) -> Result<Execution, HarnessError>;

    /// Discard captured output and any state left by earlier executions.
    async fn reset(&self) -> Result<(), HarnessError>;
}

/// Runs each program in a fresh Python process fed through stdin.
#[derive(Debug, Clone)]
pub struct PythonInterpreter {
    command: String,
}

impl Default for PythonInterpreter {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl PythonInterpreter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Last non-empty line of a Python traceback, e.g. `ZeroDivisionError: division by zero`.
fn fault_summary(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "interpreter exited with an error".to_string())
}

#[async_trait]
impl Interpreter for PythonInterpreter {
    async fn execute(&self, code: &str) -> Result<Execution, HarnessError> {
        let mut child = Command::new(&self.command)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(HarnessError::InterpreterUnavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(code.as_bytes())
                .await
                .map_err(HarnessError::InterpreterUnavailable)?;
            // stdin is dropped here, closing the pipe
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(HarnessError::InterpreterUnavailable)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let fault = (!output.status.success()).then(|| fault_summary(&stderr));
        debug!(
            exit_code = output.status.code().unwrap_or(-1),
            stdout_bytes = stdout.len(),
            faulted = fault.is_some(),
            "python execution finished"
        );

        Ok(Execution {
            stdout,
            stderr,
            fault,
        })
    }

    async fn reset(&self) -> Result<(), HarnessError> {
        // Every execution is a new process; there is no buffer to drain.
        Ok(())
    }
}

/// True when `command` can be spawned on this machine.
pub async fn interpreter_available(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}
