//! # Dispatch Engine
//!
//! File: cli/src/wrapper/dispatch.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module turns argument vectors into process activity and settles one
//! `PendingCall` per request. Each wrapper instance owns one `Dispatcher` task
//! that receives requests in submission order over an unbounded channel.
//!
//! ## Architecture
//!
//! **Exec mode** (`persistent == false`): every request is joined with single
//! spaces into a command line and handed to `ProcessHost::exec` on its own
//! task, so exec calls run concurrently. The completed `ExecOutput` is folded
//! into the buffer under one lock:
//! 1. OS-level error text is appended (and the call will reject).
//! 2. Non-empty stderr is appended; the call rejects with a snapshot taken here.
//! 3. Non-empty stdout is appended.
//! 4. Without error or stderr the call resolves with a snapshot.
//! 5. The buffer is flushed through the instance sink.
//!
//! **Persistent mode**: the dispatcher owns at most one `ProcessHandle`.
//! - With no live process, `argv[0]` is started with `argv[1..]` as its
//!   arguments (an empty remainder becomes a single empty-string argument).
//!   A pump task forwards the process's notifications into `Shared::on_event`:
//!   stdout resolves and stderr rejects the call currently in flight; the exit
//!   notification appends `Child process exited with code N.`, marks the
//!   process `Terminated` and resolves any call still in flight.
//! - With a live process, `argv[1..]` is joined with spaces and written
//!   verbatim to its input. Only one such call is in flight at a time: the
//!   dispatcher waits for its settlement before taking the next request, and
//!   the call settles on the first notification after its write.
//! - A start call that has produced nothing by the time the next request
//!   arrives is resolved with the current buffer before the write happens.
//!
//! Every settlement flushes the buffer through the sink; the flushed lines are
//! the call's payload. The settle slot is always locked before the buffer, and
//! the sink only runs once the buffer lock is released.
//!
use super::buffer::{deliver, LineSink, OutputBuffer};
use super::call::CallReply;
use super::format::LineFormatter;
use super::state::{CallStatus, ProcessState};
use crate::common::process::{ExecOutput, ProcessEvent, ProcessHandle, ProcessHost, SpawnOptions};
use crate::core::error::ClapiError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, trace, warn};

/// State shared between a wrapper, its dispatcher and its pump task.
pub(crate) struct Shared {
    pub(crate) command: String,
    pub(crate) persistent: bool,
    pub(crate) formatter: LineFormatter,
    pub(crate) buffer: OutputBuffer,
    pub(crate) sink: LineSink,
    pub(crate) spawn_options: SpawnOptions,
    pub(crate) host: Arc<dyn ProcessHost>,
    state: Mutex<ProcessState>,
    in_flight: Mutex<Option<CallReply>>,
    last_call: Mutex<Option<watch::Receiver<CallStatus>>>,
}

/// How a notification settles the call in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Resolve,
    Reject,
}

impl Shared {
    pub(crate) fn new(
        command: String,
        persistent: bool,
        formatter: LineFormatter,
        buffer: OutputBuffer,
        sink: LineSink,
        spawn_options: SpawnOptions,
        host: Arc<dyn ProcessHost>,
    ) -> Self {
        Self {
            command,
            persistent,
            formatter,
            buffer,
            sink,
            spawn_options,
            host,
            state: Mutex::new(ProcessState::Idle),
            in_flight: Mutex::new(None),
            last_call: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> ProcessState {
        *self.state.lock()
    }

    fn set_state(&self, state: ProcessState) {
        let mut current = self.state.lock();
        trace!("Process state {} -> {}", *current, state);
        *current = state;
    }

    pub(crate) fn record_call(&self, status: watch::Receiver<CallStatus>) {
        *self.last_call.lock() = Some(status);
    }

    pub(crate) fn last_call_status(&self) -> Option<CallStatus> {
        self.last_call.lock().as_ref().map(|status| *status.borrow())
    }

    fn append_text(&self, text: &str) {
        self.buffer.append(self.formatter.format_text(text));
    }

    fn flush(&self) -> Vec<String> {
        self.buffer.flush(&*self.sink)
    }

    fn settle(&self, reply: CallReply, outcome: Outcome) {
        let lines = self.flush();
        match outcome {
            Outcome::Resolve => reply.resolve(lines),
            Outcome::Reject => reply.reject(lines),
        }
    }

    /// Applies one process notification to the buffer and the call in flight.
    fn on_event(&self, event: ProcessEvent) {
        let mut in_flight = self.in_flight.lock();
        let outcome = match event {
            ProcessEvent::Stdout(text) => {
                self.append_text(&text);
                Outcome::Resolve
            }
            ProcessEvent::Stderr(text) => {
                self.append_text(&text);
                Outcome::Reject
            }
            ProcessEvent::Exit(code) => {
                let code = code.map_or_else(|| "null".to_string(), |c| c.to_string());
                info!("'{}' exited with code {}", self.command, code);
                self.append_text(&format!("Child process exited with code {code}."));
                self.set_state(ProcessState::Terminated);
                Outcome::Resolve
            }
        };
        match in_flight.take() {
            Some(reply) => self.settle(reply, outcome),
            None => trace!("Notification arrived with no call in flight; kept in buffer"),
        }
    }

    /// Resolves a start call that is still waiting for its first notification.
    fn supersede_in_flight(&self) {
        let mut in_flight = self.in_flight.lock();
        if let Some(reply) = in_flight.take() {
            debug!("Resolving the pending start call before writing the next one");
            self.settle(reply, Outcome::Resolve);
        }
    }

    /// Folds a completed one-shot execution into the buffer and settles `reply`.
    fn settle_exec(&self, output: ExecOutput, reply: CallReply) {
        let mut lines = self.buffer.lock();
        let mut rejected = false;
        if let Some(error) = &output.error {
            lines.extend(self.formatter.format_text(error));
            rejected = true;
        }
        if !output.stderr.is_empty() {
            lines.extend(self.formatter.format_text(&output.stderr));
            rejected = true;
        }
        let rejection = rejected.then(|| lines.clone());
        if !output.stdout.is_empty() {
            lines.extend(self.formatter.format_text(&output.stdout));
        }
        let flushed = std::mem::take(&mut *lines);
        drop(lines);
        deliver(&flushed, &*self.sink);
        match rejection {
            Some(snapshot) => reply.reject(snapshot),
            None => reply.resolve(flushed),
        }
    }
}

/// One queued dispatch.
pub(crate) struct Request {
    pub(crate) argv: Vec<String>,
    pub(crate) reply: CallReply,
}

/// Processes one instance's requests in order.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    requests: mpsc::UnboundedReceiver<Request>,
    shutdown: watch::Receiver<bool>,
    handle: Option<Box<dyn ProcessHandle>>,
    pump: Option<tokio::task::JoinHandle<()>>,
    stopping: bool,
}

impl Dispatcher {
    pub(crate) fn new(
        shared: Arc<Shared>,
        requests: mpsc::UnboundedReceiver<Request>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            shared,
            requests,
            shutdown,
            handle: None,
            pump: None,
            stopping: false,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("Dispatcher for '{}' started", self.shared.command);
        while !self.stopping {
            tokio::select! {
                biased;
                Ok(()) = self.shutdown.changed() => self.stopping = *self.shutdown.borrow(),
                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => self.stopping = true,
                },
            }
        }
        self.teardown().await;
        debug!("Dispatcher for '{}' stopped", self.shared.command);
    }

    async fn handle_request(&mut self, request: Request) {
        let Request { argv, reply } = request;
        if !self.shared.persistent {
            tokio::spawn(exec_call(Arc::clone(&self.shared), argv, reply));
            return;
        }
        if self.shared.state().needs_start() {
            // The previous process (if any) has exited; its handle is spent.
            self.handle = None;
            self.start(argv, reply);
        } else {
            self.reuse(argv, reply).await;
        }
    }

    #[instrument(skip_all, fields(command = %self.shared.command))]
    fn start(&mut self, argv: Vec<String>, reply: CallReply) {
        let Some((program, rest)) = argv.split_first() else {
            reply.reject(Vec::new());
            return;
        };
        // A lone executable is started with one empty argument, not with none.
        let args = if rest.is_empty() {
            vec![String::new()]
        } else {
            rest.to_vec()
        };

        self.shared.supersede_in_flight();
        self.shared.set_state(ProcessState::Starting);
        info!("Starting persistent process '{}' with args {:?}", program, args);

        match self
            .shared
            .host
            .spawn(program, &args, &self.shared.spawn_options)
        {
            Ok(process) => {
                // Install the reply before any notification can be pumped.
                *self.shared.in_flight.lock() = Some(reply);
                self.shared.set_state(ProcessState::Connected);
                self.handle = Some(process.handle);
                self.pump = Some(tokio::spawn(pump(
                    Arc::clone(&self.shared),
                    process.events,
                )));
            }
            Err(e) => {
                warn!("Failed to start '{}': {}", program, e);
                self.shared.set_state(ProcessState::Idle);
                let _in_flight = self.shared.in_flight.lock();
                self.shared.append_text(&e.to_string());
                self.shared.settle(reply, Outcome::Reject);
            }
        }
    }

    #[instrument(skip_all, fields(command = %self.shared.command))]
    async fn reuse(&mut self, argv: Vec<String>, reply: CallReply) {
        let Some(handle) = self.handle.as_mut() else {
            warn!("Process marked connected but no handle is held");
            reply.reject(Vec::new());
            return;
        };
        let input = argv.get(1..).unwrap_or_default().join(" ");

        self.shared.supersede_in_flight();
        let (settled_tx, settled_rx) = oneshot::channel();
        *self.shared.in_flight.lock() = Some(reply.notify_on_settle(settled_tx));

        debug!("Writing {:?} to persistent process", input);
        // A child that never reads its input must not keep destroy() waiting.
        let written = tokio::select! {
            result = handle.write(&input) => result,
            Ok(()) = self.shutdown.changed() => {
                debug!("Shutdown requested while writing; abandoning the write");
                self.stopping = true;
                return;
            }
        };
        if let Err(e) = written {
            warn!("Write to persistent process failed: {}", e);
            let mut in_flight = self.shared.in_flight.lock();
            // The call may already be settled by output that raced the failure;
            // the error text is kept either way.
            self.shared.append_text(&e.to_string());
            if let Some(reply) = in_flight.take() {
                self.shared.settle(reply, Outcome::Reject);
            }
            return;
        }

        // One call in flight at a time: wait for this one before the next request.
        tokio::select! {
            _ = settled_rx => {}
            Ok(()) = self.shutdown.changed() => self.stopping = *self.shutdown.borrow(),
        }
    }

    async fn teardown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if handle.is_connected() {
                info!("Disconnecting persistent process '{}'", self.shared.command);
                handle.disconnect().await;
            }
        }
        if let Some(pump) = self.pump.take() {
            // Lets the exit notification land in the buffer before teardown returns.
            if let Err(e) = pump.await {
                warn!("Notification pump failed: {}", e);
            }
        }
        self.requests.close();
        while let Ok(request) = self.requests.try_recv() {
            request.reply.settle(Err(ClapiError::Destroyed));
        }
        if let Some(reply) = self.shared.in_flight.lock().take() {
            reply.settle(Err(ClapiError::Destroyed));
        }
    }
}

/// Runs one exec-mode call to completion.
#[instrument(skip_all, fields(command = %shared.command))]
async fn exec_call(shared: Arc<Shared>, argv: Vec<String>, reply: CallReply) {
    let command_line = argv.join(" ");
    debug!("Executing {:?}", command_line);
    let output = shared.host.exec(&command_line, &shared.spawn_options).await;
    shared.settle_exec(output, reply);
}

/// Forwards a process's notifications until it exits.
async fn pump(shared: Arc<Shared>, mut events: mpsc::UnboundedReceiver<ProcessEvent>) {
    while let Some(event) = events.recv().await {
        let exited = matches!(event, ProcessEvent::Exit(_));
        shared.on_event(event);
        if exited {
            return;
        }
    }
    debug!("Notification stream closed without an exit notification");
    shared.on_event(ProcessEvent::Exit(None));
}
