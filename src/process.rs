//! External process execution.
//!
//! Every call to `gh`, `release-cli`, `docker` and `git` goes through the
//! [`CommandRunner`] trait so publishers can be driven by a scripted runner
//! in tests.

use crate::error::{CliError, ReleaseError};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// A program invocation: program name, arguments, extra environment and
/// optional working directory.
///
/// Only the program and arguments are shown by `Display`, so secrets belong
/// in `env`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandSpec {
    /// Program looked up on PATH
    pub program: String,
    /// Arguments, passed verbatim (no shell)
    pub args: Vec<String>,
    /// Variables added to the inherited environment
    pub env: Vec<(String, String)>,
    /// Working directory, inherited when `None`
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Starts a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program and arguments as one slice-friendly vector.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// Captured result of a finished process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal
    pub code: Option<i32>,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short failure description for error messages.
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.code, stderr.is_empty()) {
            (Some(code), true) => format!("exit code {code}"),
            (Some(code), false) => format!("exit code {code}: {stderr}"),
            (None, _) => "terminated by signal".to_string(),
        }
    }
}

/// Runs external programs.
///
/// `Err` means the program could not be run at all (not found, timed out);
/// a non-zero exit is a successful run with a failed [`CommandOutput`].
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs `command` to completion and captures its output.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ReleaseError>;

    /// Resolves `tool` on PATH.
    ///
    /// # Errors
    ///
    /// [`crate::bundler::Error::ToolMissing`] if it is not installed.
    fn locate(&self, tool: &str) -> crate::bundler::Result<PathBuf> {
        crate::bundler::tool_detection::require_tool(tool)
    }
}

/// Timeout for a single external command (30 minutes)
/// Multi-arch image builds are the slowest calls we make
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(1800);

/// Production runner backed by `tokio::process`.
#[derive(Clone, Debug)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    /// Creates a runner with the given per-command timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(COMMAND_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ReleaseError> {
        log::debug!("$ {command}");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ReleaseError::Cli(CliError::ExecutionFailed {
                    command: command.to_string(),
                    reason: format!("timed out after {} seconds", self.timeout.as_secs()),
                })
            })?
            .map_err(|e| {
                ReleaseError::Cli(CliError::ExecutionFailed {
                    command: command.to_string(),
                    reason: e.to_string(),
                })
            })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !output.success() {
            log::debug!("{} → {}", command.program, output.failure_reason());
        }
        Ok(output)
    }
}

/// Scripted runner for unit tests.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Rule {
        prefix: Vec<String>,
        responses: VecDeque<CommandOutput>,
        last: CommandOutput,
    }

    /// Records every command and answers from scripted rules.
    ///
    /// A rule matches when the argv starts with its prefix; the first matching
    /// rule wins. Each rule hands out its responses in order and then keeps
    /// repeating the final one. Unmatched commands succeed with empty output.
    #[derive(Default)]
    pub struct ScriptedRunner {
        rules: Mutex<Vec<Rule>>,
        calls: Mutex<Vec<CommandSpec>>,
        missing_tools: Vec<String>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Scripts the responses for commands starting with `prefix`.
        pub fn on(self, prefix: &[&str], responses: Vec<CommandOutput>) -> Self {
            let mut responses: VecDeque<CommandOutput> = responses.into();
            if responses.is_empty() {
                responses.push_back(CommandOutput::ok(""));
            }
            let last = responses.back().cloned().unwrap_or_default();
            self.rules.lock().unwrap().push(Rule {
                prefix: prefix.iter().map(|s| s.to_string()).collect(),
                responses,
                last,
            });
            self
        }

        /// Pretends `tool` is not installed. Every other tool is found.
        pub fn without_tool(mut self, tool: &str) -> Self {
            self.missing_tools.push(tool.to_string());
            self
        }

        /// Every command run so far.
        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// Commands whose argv starts with `prefix`.
        pub fn calls_matching(&self, prefix: &[&str]) -> Vec<CommandSpec> {
            self.calls()
                .into_iter()
                .filter(|c| c.argv().starts_with(prefix))
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ReleaseError> {
            self.calls.lock().unwrap().push(command.clone());
            let argv = command.argv();
            let mut rules = self.rules.lock().unwrap();
            let Some(rule) = rules.iter_mut().find(|r| {
                let prefix: Vec<&str> = r.prefix.iter().map(String::as_str).collect();
                argv.starts_with(&prefix)
            }) else {
                return Ok(CommandOutput::ok(""));
            };
            Ok(rule.responses.pop_front().unwrap_or_else(|| rule.last.clone()))
        }

        fn locate(&self, tool: &str) -> crate::bundler::Result<PathBuf> {
            if self.missing_tools.iter().any(|t| t == tool) {
                Err(crate::bundler::Error::ToolMissing {
                    tool: tool.to_string(),
                })
            } else {
                Ok(PathBuf::from("/usr/bin").join(tool))
            }
        }
    }
}
