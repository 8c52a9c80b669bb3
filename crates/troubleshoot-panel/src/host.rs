//! Host process transport.
//!
//! Runs the host as a child process and frames the bridge over its stdio:
//! outbound messages are written to the child's stdin as JSON lines, and
//! every non-empty line on the child's stdout becomes an inbound frame.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::bridge::{self, HostBridge};

/// A running host child process.
#[derive(Debug)]
pub struct HostProcess {
    child: Child,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl HostProcess {
    /// Spawn `argv` and connect a bridge to its stdio.
    pub fn spawn(argv: &[String]) -> Result<(Self, HostBridge), HostError> {
        let (program, args) = argv.split_first().ok_or(HostError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HostError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or(HostError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(HostError::MissingPipe("stdout"))?;

        let (panel_side, host_side) = bridge::channel();
        let (frames_tx, mut outbound_rx) = host_side.split();

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        if frames_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("host closed its output");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed reading host output");
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let line = match message.to_json() {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed encoding outbound message");
                        continue;
                    }
                };
                let written = async {
                    stdin.write_all(line.as_bytes()).await?;
                    stdin.write_all(b"\n").await?;
                    stdin.flush().await
                };
                if let Err(e) = written.await {
                    tracing::warn!(error = %e, "failed writing to host");
                    break;
                }
            }
        });

        tracing::info!(program = %program, "spawned host process");
        Ok((
            Self {
                child,
                reader,
                writer,
            },
            panel_side,
        ))
    }

    /// OS process id, if still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Stop the host and its I/O tasks.
    pub async fn shutdown(mut self) -> Result<(), HostError> {
        self.reader.abort();
        self.writer.abort();
        if self.child.try_wait().map_err(HostError::Io)?.is_none() {
            self.child.kill().await.map_err(HostError::Io)?;
        }
        Ok(())
    }
}

/// Errors from the host process transport.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// No program was given.
    #[error("host command is empty")]
    EmptyCommand,

    /// The program could not be started.
    #[error("failed to spawn host `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stdio pipe was not available after spawning.
    #[error("host {0} pipe unavailable")]
    MissingPipe(&'static str),

    /// Process control failed.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}
