//! Blocking external process execution with captured output and an optional timeout.

use crate::error::{FirstDayError, Result};
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of one external process run.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Rendered command line, for error messages.
    pub command: String,
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Raw standard output.
    pub stdout: Vec<u8>,
    /// Raw standard error.
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Returns true if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Standard output decoded lossily as UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error decoded lossily as UTF-8 and trimmed.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Converts a non-zero exit into `CommandFailed`.
    pub fn check(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(FirstDayError::CommandFailed {
                status: self.status.to_string(),
                stderr: self.stderr_lossy(),
                command: self.command,
            })
        }
    }
}

/// Runs external programs synchronously.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Create a runner. `None` waits for every process indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Start building an invocation of `program`.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Invocation<'_> {
        Invocation {
            runner: self,
            program: program.as_ref().to_string_lossy().into_owned(),
            args: Vec::new(),
            cwd: None,
            input: None,
        }
    }

    fn execute(&self, inv: Invocation<'_>) -> Result<ProcessOutput> {
        let rendered = inv.render();
        debug!(command = %rendered, "running");

        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .stdin(if inv.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &inv.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| FirstDayError::SpawnFailed {
            program: inv.program.clone(),
            source: e,
        })?;

        // Feed stdin and drain both pipes on their own threads so a full pipe never blocks the child.
        let writer = match (child.stdin.take(), inv.input) {
            (Some(mut stdin), Some(input)) => Some(thread::spawn(move || {
                // A child that exits early closes the pipe; its exit status reports the real problem.
                let _ = stdin.write_all(&input);
            })),
            _ => None,
        };
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => {
                let start = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if start.elapsed() > limit {
                        warn!(command = %rendered, timeout_secs = limit.as_secs(), "killing timed out process");
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(FirstDayError::CommandTimeout {
                            command: rendered,
                            timeout_secs: limit.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        if let Some(handle) = writer {
            let _ = handle.join();
        }
        let stdout = join_drain(stdout);
        let stderr = join_drain(stderr);

        Ok(ProcessOutput {
            command: rendered,
            status,
            stdout,
            stderr,
        })
    }
}

/// A single pending invocation built by [`CommandRunner::command`].
pub struct Invocation<'a> {
    runner: &'a CommandRunner,
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    input: Option<Vec<u8>>,
}

impl Invocation<'_> {
    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Run in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Bytes written to the child's standard input.
    pub fn stdin_bytes(mut self, input: Vec<u8>) -> Self {
        self.input = Some(input);
        self
    }

    /// Run to completion, returning the output whatever the exit status.
    pub fn output(self) -> Result<ProcessOutput> {
        let runner = self.runner;
        runner.execute(self)
    }

    /// Run to completion, failing with `CommandFailed` on a non-zero exit.
    pub fn checked(self) -> Result<ProcessOutput> {
        self.output()?.check()
    }

    fn render(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_drain(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
