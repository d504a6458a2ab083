//! In-memory `ProcessHost` for unit tests.
//!
//! Exec results are queued up front; spawned processes are recorded and their
//! notification senders handed back to the test so it can push stdout/stderr/
//! exit events at exactly the moment it wants.

use super::{ExecOutput, ProcessEvent, ProcessHandle, ProcessHost, SpawnOptions, SpawnedProcess};
use crate::core::error::ClapiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What a test can see of (and do to) one fake process.
#[derive(Clone)]
pub(crate) struct FakeProcess {
    pub program: String,
    pub args: Vec<String>,
    pub options: SpawnOptions,
    pub events: mpsc::UnboundedSender<ProcessEvent>,
    pub writes: Arc<Mutex<Vec<String>>>,
    pub connected: Arc<AtomicBool>,
    pub disconnects: Arc<AtomicUsize>,
}

impl FakeProcess {
    pub fn stdout(&self, text: &str) {
        let _ = self.events.send(ProcessEvent::Stdout(text.to_string()));
    }

    pub fn stderr(&self, text: &str) {
        let _ = self.events.send(ProcessEvent::Stderr(text.to_string()));
    }

    pub fn exit(&self, code: Option<i32>) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.events.send(ProcessEvent::Exit(code));
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct FakeHost {
    exec_results: Mutex<VecDeque<ExecOutput>>,
    exec_log: Mutex<Vec<(String, SpawnOptions)>>,
    processes: Mutex<Vec<FakeProcess>>,
    /// Spawned processes copy every write straight back to stdout.
    pub echo: bool,
    /// Every spawn fails with `NotFound`.
    pub fail_spawn: bool,
    /// Writes echo, give the echo time to settle the call, then fail.
    pub fail_after_echo: bool,
}

impl FakeHost {
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn echoing_then_failing() -> Self {
        Self {
            echo: true,
            fail_after_echo: true,
            ..Self::default()
        }
    }

    pub fn push_exec(&self, stdout: &str, stderr: &str, error: Option<&str>) {
        self.exec_results.lock().push_back(ExecOutput {
            error: error.map(str::to_string),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        });
    }

    pub fn exec_lines(&self) -> Vec<String> {
        self.exec_log.lock().iter().map(|(line, _)| line.clone()).collect()
    }

    pub fn exec_options(&self) -> Vec<SpawnOptions> {
        self.exec_log.lock().iter().map(|(_, opts)| opts.clone()).collect()
    }

    pub fn processes(&self) -> Vec<FakeProcess> {
        self.processes.lock().clone()
    }

    pub fn process(&self, index: usize) -> FakeProcess {
        self.processes.lock()[index].clone()
    }
}

#[async_trait]
impl ProcessHost for FakeHost {
    async fn exec(&self, command_line: &str, options: &SpawnOptions) -> ExecOutput {
        self.exec_log
            .lock()
            .push((command_line.to_string(), options.clone()));
        self.exec_results.lock().pop_front().unwrap_or_default()
    }

    fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<SpawnedProcess, ClapiError> {
        if self.fail_spawn {
            return Err(ClapiError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            });
        }
        let (events, events_rx) = mpsc::unbounded_channel();
        let process = FakeProcess {
            program: program.to_string(),
            args: args.to_vec(),
            options: options.clone(),
            events,
            writes: Arc::default(),
            connected: Arc::new(AtomicBool::new(true)),
            disconnects: Arc::default(),
        };
        self.processes.lock().push(process.clone());
        Ok(SpawnedProcess {
            handle: Box::new(FakeHandle {
                process,
                echo: self.echo,
                fail_after_echo: self.fail_after_echo,
            }),
            events: events_rx,
        })
    }
}

struct FakeHandle {
    process: FakeProcess,
    echo: bool,
    fail_after_echo: bool,
}

#[async_trait]
impl ProcessHandle for FakeHandle {
    async fn write(&mut self, text: &str) -> Result<(), ClapiError> {
        if !self.process.connected.load(Ordering::SeqCst) {
            return Err(ClapiError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "process input is closed",
            )));
        }
        self.process.writes.lock().push(text.to_string());
        if self.echo {
            self.process.stdout(text);
        }
        if self.fail_after_echo {
            tokio::time::sleep(Duration::from_millis(50)).await;
            return Err(ClapiError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe closed",
            )));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.process.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&mut self) {
        self.process.disconnects.fetch_add(1, Ordering::SeqCst);
        // Behave like `cat`: closing input ends the process cleanly.
        self.process.exit(Some(0));
    }
}
