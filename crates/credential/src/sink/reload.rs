//! Reload by running an external command

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::ReloadSignal;
use crate::core::SinkError;

/// Default reload timeout
pub const DEFAULT_RELOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Restarts the proxy by running a command such as
/// `/etc/init.d/xray restart`
#[derive(Debug, Clone)]
pub struct CommandReload {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandReload {
    /// Create a reload for `program` with `args`
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_RELOAD_TIMEOUT,
        }
    }

    /// Create a reload from a full argv; `None` if `argv` is empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// Set how long the command may run before it is killed
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command line as a single string, for logs and errors
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ReloadSignal for CommandReload {
    async fn reload(&self) -> Result<(), SinkError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %self.command_line(), "Running reload command");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(SinkError::ReloadSpawn {
                    command: self.command_line(),
                    source,
                });
            }
            Err(_) => {
                return Err(SinkError::ReloadTimeout {
                    command: self.command_line(),
                    timeout: self.timeout,
                });
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(command = %self.command_line(), stderr = %stderr.trim(), "Reload command failed");
        }
        Err(SinkError::ReloadFailed {
            command: self.command_line(),
            status: output.status.to_string(),
        })
    }
}
