//! # Native Process Host
//!
//! File: cli/src/common/process/native.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `NativeHost` implements the process capability on top of
//! `tokio::process::Command`.
//!
//! - **exec** runs the command line through a shell (`sh -c` by default, `cmd
//!   /C` on Windows) with stdin closed and collects stdout/stderr in full. A
//!   non-zero exit status is not an error: only failing to start the shell is
//!   reported in `ExecOutput::error`.
//! - **spawn** starts the executable directly with all three standard streams
//!   piped. Two reader tasks turn stdout/stderr into line-buffered
//!   `ProcessEvent`s; a supervisor task owns the `Child`, waits for it (or
//!   kills it on request), waits for both readers to reach EOF and then sends
//!   the single `Exit` event.
//!
//! Disconnecting a handle closes stdin and gives the process
//! `HostOptions::disconnect_grace` to exit on its own before it is killed.
//! Dropping a handle without disconnecting kills the process.
//!
use super::{ExecOutput, ProcessEvent, ProcessHandle, ProcessHost, SpawnOptions, SpawnedProcess};
use crate::core::error::ClapiError;
use async_trait::async_trait;
use std::{io, process::Stdio, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdin, Command},
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, instrument, trace, warn};

const READ_CHUNK_SIZE: usize = 8192;

/// Settings for the native host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    /// Shell used to run one-shot command lines.
    pub shell: String,
    /// Arguments placed between the shell and the command line.
    pub shell_args: Vec<String>,
    /// How long a disconnected process may take to exit before it is killed.
    pub disconnect_grace: Duration,
}

impl Default for HostOptions {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                shell: "cmd".to_string(),
                shell_args: vec!["/C".to_string()],
                disconnect_grace: Duration::from_secs(2),
            }
        } else {
            Self {
                shell: "sh".to_string(),
                shell_args: vec!["-c".to_string()],
                disconnect_grace: Duration::from_secs(2),
            }
        }
    }
}

/// Process host backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct NativeHost {
    options: HostOptions,
}

impl NativeHost {
    pub fn new(options: HostOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }
}

#[async_trait]
impl ProcessHost for NativeHost {
    #[instrument(skip(self, options))]
    async fn exec(&self, command_line: &str, options: &SpawnOptions) -> ExecOutput {
        let mut command = Command::new(&self.options.shell);
        command
            .args(&self.options.shell_args)
            .arg(command_line)
            .stdin(Stdio::null());
        if let Some(dir) = &options.working_dir {
            command.current_dir(dir);
        }

        match command.output().await {
            Ok(output) => {
                debug!("Command line finished with status {}", output.status);
                ExecOutput {
                    error: None,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
            Err(e) => {
                warn!("Failed to run command line '{}': {}", command_line, e);
                ExecOutput {
                    error: Some(format!(
                        "Failed to run '{}' via {}: {}",
                        command_line, self.options.shell, e
                    )),
                    ..ExecOutput::default()
                }
            }
        }
    }

    #[instrument(skip(self, options))]
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<SpawnedProcess, ClapiError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &options.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ClapiError::Spawn {
            program: program.to_string(),
            source,
        })?;
        debug!("Spawned '{}' with pid {:?}", program, child.id());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (exited_tx, exited_rx) = watch::channel(false);
        let (kill_tx, kill_rx) = oneshot::channel();

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(
                stdout,
                events_tx.clone(),
                ProcessEvent::Stdout,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(
                stderr,
                events_tx.clone(),
                ProcessEvent::Stderr,
            )));
        }
        let stdin = child.stdin.take();

        tokio::spawn(supervise(child, readers, kill_rx, events_tx, exited_tx));

        Ok(SpawnedProcess {
            handle: Box::new(NativeHandle {
                stdin,
                kill: Some(kill_tx),
                exited: exited_rx,
                grace: self.options.disconnect_grace,
            }),
            events: events_rx,
        })
    }
}

/// Reads `reader` to EOF, sending each batch of complete lines as one event.
/// A trailing partial line is held until more data arrives or the stream ends.
async fn forward_lines<R>(
    mut reader: R,
    events: mpsc::UnboundedSender<ProcessEvent>,
    wrap: fn(String) -> ProcessEvent,
) where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(count) => {
                pending.extend_from_slice(&chunk[..count]);
                if let Some(last_newline) = pending.iter().rposition(|b| *b == b'\n') {
                    let complete: Vec<u8> = pending.drain(..=last_newline).collect();
                    trace!("Read {} bytes of complete lines", complete.len());
                    // Keep draining even if nobody listens, so the child never blocks on a full pipe.
                    let _ = events.send(wrap(String::from_utf8_lossy(&complete).into_owned()));
                }
            }
            Err(e) => {
                warn!("Error reading process output: {}", e);
                break;
            }
        }
    }
    if !pending.is_empty() {
        let _ = events.send(wrap(String::from_utf8_lossy(&pending).into_owned()));
    }
}

/// Owns the child until it exits, then reports `Exit` after all output has been forwarded.
async fn supervise(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    kill: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<ProcessEvent>,
    exited: watch::Sender<bool>,
) {
    let waited = tokio::select! {
        status = child.wait() => Some(status),
        // Fires on an explicit kill request and when the handle is dropped.
        _ = kill => None,
    };
    let status = match waited {
        Some(status) => status,
        None => {
            debug!("Killing process {:?}", child.id());
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill process: {}", e);
            }
            child.wait().await
        }
    };
    for reader in readers {
        if let Err(e) = reader.await {
            warn!("Output reader task failed: {}", e);
        }
    }

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!("Failed to wait for process: {}", e);
            None
        }
    };
    debug!("Process exited with code {:?}", code);
    exited.send_replace(true);
    let _ = events.send(ProcessEvent::Exit(code));
}

struct NativeHandle {
    stdin: Option<ChildStdin>,
    kill: Option<oneshot::Sender<()>>,
    exited: watch::Receiver<bool>,
    grace: Duration,
}

#[async_trait]
impl ProcessHandle for NativeHandle {
    async fn write(&mut self, text: &str) -> Result<(), ClapiError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            ClapiError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "process input is closed",
            ))
        })?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(ClapiError::Write)?;
        stdin.flush().await.map_err(ClapiError::Write)
    }

    fn is_connected(&self) -> bool {
        self.stdin.is_some() && !*self.exited.borrow()
    }

    async fn disconnect(&mut self) {
        // Dropping stdin delivers EOF to the process.
        drop(self.stdin.take());
        let grace = self.grace;
        let exited = self.exited.wait_for(|done| *done);
        if tokio::time::timeout(grace, exited).await.is_err() {
            debug!("Process did not exit within {:?} of disconnect, killing", grace);
            if let Some(kill) = self.kill.take() {
                let _ = kill.send(());
            }
        }
    }
}
