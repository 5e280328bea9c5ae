//! Scripted stand-in for the provider CLIs

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::cli::{CommandOutput, Invocation, KmsCli};
use crate::error::Result;

/// What the fake CLI does for one invocation
pub enum Reply {
    /// Exit 0 with this stdout
    Stdout(String),
    /// Exit 1 with this stderr
    Fail(String),
    /// Write the contents to the `--output-file` argument, exit 0
    WriteFile(String),
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Reply::Stdout(value.to_string())
    }

    pub fn stdout(s: impl Into<String>) -> Self {
        Reply::Stdout(s.into())
    }

    pub fn fail(s: impl Into<String>) -> Self {
        Reply::Fail(s.into())
    }
}

type Script = Box<dyn Fn(&Invocation) -> Reply + Send + Sync>;

pub struct ScriptedCli {
    script: Script,
    calls: Mutex<Vec<Invocation>>,
    rendezvous: Option<Barrier>,
}

impl ScriptedCli {
    pub fn new(script: impl Fn(&Invocation) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            rendezvous: None,
        }
    }

    /// Every call blocks until `n` calls are in flight together
    pub fn with_rendezvous(
        n: usize,
        script: impl Fn(&Invocation) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            rendezvous: Some(Barrier::new(n)),
            ..Self::new(script)
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KmsCli for ScriptedCli {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }

        let output = match (self.script)(invocation) {
            Reply::Stdout(stdout) => CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.into_bytes(),
                stderr: Vec::new(),
            },
            Reply::Fail(stderr) => CommandOutput {
                success: false,
                code: Some(1),
                stdout: Vec::new(),
                stderr: stderr.into_bytes(),
            },
            Reply::WriteFile(contents) => {
                let path = invocation
                    .flag_value("--output-file")
                    .expect("WriteFile reply needs --output-file");
                std::fs::write(path, contents).expect("write scripted output file");
                CommandOutput {
                    success: true,
                    code: Some(0),
                    ..Default::default()
                }
            }
        };

        Ok(output)
    }
}
