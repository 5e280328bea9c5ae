//! Provider CLI invocation
//!
//! All cloud access goes through the `aws` and `gcloud` command-line tools.
//! [`KmsCli`] is the seam: [`SystemCli`] runs real subprocesses, tests swap in
//! a scripted fake.
//!
//! Batches are fork-join: every command in a batch is started before any of
//! them is awaited, and the caller resumes only when all have exited. There is
//! no timeout, so a hung CLI blocks the run.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

use crate::error::{KmsError, Result};

/// A single external command: program plus arguments, no shell involved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Value following `flag`, if present
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Something that can run a provider CLI command to completion
#[async_trait]
pub trait KmsCli: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands as real OS subprocesses
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCli;

#[async_trait]
impl KmsCli for SystemCli {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(command = %invocation, "Spawning");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| KmsError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        Ok(output.into())
    }
}

/// Run a command and return its stdout, failing on a non-zero exit
pub async fn run_checked<C>(cli: &C, invocation: &Invocation) -> Result<Vec<u8>>
where
    C: KmsCli + ?Sized,
{
    let output = cli.execute(invocation).await?;

    if !output.success {
        return Err(KmsError::CommandFailed {
            command: invocation.to_string(),
            status: output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Run a command and parse its stdout as JSON
pub async fn run_json<C, T>(cli: &C, invocation: &Invocation) -> Result<T>
where
    C: KmsCli + ?Sized,
    T: DeserializeOwned,
{
    let stdout = run_checked(cli, invocation).await?;
    serde_json::from_slice(&stdout).map_err(|source| KmsError::InvalidJson {
        command: invocation.to_string(),
        source,
    })
}

/// Launch every command, then wait for all of them.
///
/// Results come back in the order of `invocations`, whatever order the
/// processes finished in.
pub async fn run_batch<C>(cli: &C, invocations: &[Invocation]) -> Vec<Result<Vec<u8>>>
where
    C: KmsCli + ?Sized,
{
    debug!(count = invocations.len(), "Launching command batch");
    join_all(invocations.iter().map(|inv| run_checked(cli, inv))).await
}
