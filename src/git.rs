// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Running git and streaming its output

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::log_stream::header_format;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// How much of a non-fatal stderr to echo into the log
const STDERR_PREVIEW_CHARS: usize = 200;

/// The history extraction command: every commit, numstat, one diff per parent
#[derive(Debug, Clone)]
pub struct LogCommand {
    program: String,
    repo: PathBuf,
    all_refs: bool,
    timeout: Duration,
    read_buffer_bytes: usize,
}

/// What a successful run left behind besides its stdout
#[derive(Debug, Clone, Default)]
pub struct LogOutcome {
    /// Warnings git printed while still exiting 0
    pub stderr: String,
}

impl LogCommand {
    /// Log command for the repository at `repo`
    #[must_use]
    pub fn new(repo: &Path, config: &IngestConfig) -> Self {
        Self {
            program: "git".to_string(),
            repo: repo.to_path_buf(),
            all_refs: config.all_refs,
            timeout: Duration::from_secs(config.timeout_secs),
            read_buffer_bytes: config.read_buffer_bytes.max(8 * 1024),
        }
    }

    /// Use a different executable in place of `git`
    #[must_use]
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Arguments passed to the program
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-C".to_string(),
            self.repo.to_string_lossy().into_owned(),
            "log".to_string(),
        ];
        if self.all_refs {
            args.push("--all".to_string());
        }
        args.push(format!("--format={}", header_format()));
        args.push("--numstat".to_string());
        args.push("-m".to_string());
        args
    }

    /// Run the command, handing every stdout line to `on_line`
    ///
    /// stdout and stderr are drained together so a chatty stderr cannot stall
    /// the child. Invalid UTF-8 is replaced, not rejected.
    pub async fn stream<F>(&self, mut on_line: F) -> Result<LogOutcome>
    where
        F: FnMut(&str),
    {
        debug!("Running {} {}", self.program, self.args().join(" "));

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;
        let mut stderr = child.stderr.take().ok_or_else(|| not_captured("stderr"))?;
        let buffer_bytes = self.read_buffer_bytes;

        let result = tokio::time::timeout(self.timeout, async {
            let read_stdout = async {
                let mut reader = BufReader::with_capacity(buffer_bytes, stdout);
                let mut line = Vec::new();
                loop {
                    line.clear();
                    if reader.read_until(b'\n', &mut line).await? == 0 {
                        break;
                    }
                    on_line(&String::from_utf8_lossy(&line));
                }
                Ok::<_, std::io::Error>(())
            };
            let read_stderr = async {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf).await.map(|_| buf)
            };

            let (out, err) = tokio::join!(read_stdout, read_stderr);
            out?;
            let err = err?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, String::from_utf8_lossy(&err).into_owned()))
        })
        .await;

        match result {
            Ok(Ok((status, stderr))) => {
                if !status.success() {
                    return Err(Error::CommandFailed { status, stderr });
                }
                if !stderr.trim().is_empty() {
                    let preview: String = stderr.chars().take(STDERR_PREVIEW_CHARS).collect();
                    warn!("git log wrote to stderr (exit 0): {}", preview.trim_end());
                }
                Ok(LogOutcome { stderr })
            }
            Ok(Err(e)) => Err(Error::Stream(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(Error::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

fn not_captured(stream: &str) -> Error {
    Error::Stream(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("child {stream} was not captured"),
    ))
}

/// Paths tracked in the repository's index (`git ls-files`)
pub fn ls_files(repo: &Path) -> Result<Vec<String>> {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(repo)
        .arg("ls-files")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            program: "git".to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}
