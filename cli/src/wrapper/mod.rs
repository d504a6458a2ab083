//! # clapi Wrapper (`wrapper`)
//!
//! File: cli/src/wrapper/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! A `Wrapper` turns an external executable into something you call like a
//! function. Each call appends its arguments to the wrapped command, runs it,
//! and yields the captured output as prefixed lines.
//!
//! ```rust,no_run
//! use clapi::{Wrapper, WrapperOptions};
//!
//! # async fn run() -> Result<(), clapi::ClapiError> {
//! let echo = Wrapper::new("echo", WrapperOptions::default().with_prefix("echo: "));
//! assert_eq!(echo.call(["hello, world"]).await?, vec!["echo: hello, world"]);
//!
//! let git = Wrapper::new("git", WrapperOptions::default());
//! let status = git.method("status");
//! for line in status.call(["--short"]).await? {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modes
//!
//! - **Exec** (default): every call runs `command args...` through the shell
//!   and waits for it to finish. Output on stderr (or a failure to run at all)
//!   rejects the call with `ClapiError::Rejected`; a non-zero exit status on
//!   its own does not.
//! - **Persistent**: the first call starts the command once; later calls write
//!   their arguments to its standard input and settle on the next output the
//!   process produces. Callers supply any newline the process expects.
//!
//! ```rust,no_run
//! use clapi::{Wrapper, WrapperOptions};
//!
//! # async fn run() -> Result<(), clapi::ClapiError> {
//! let cat = Wrapper::new("cat", WrapperOptions::default().with_persistent(true));
//! let started = cat.call(["-"]);
//! let echoed = cat.call(["hello\n"]).await?;
//! assert_eq!(echoed, vec!["hello"]);
//! drop(started);
//! let remaining = cat.destroy().await;
//! assert_eq!(remaining, vec!["Child process exited with code 0."]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `format`: the line formatter.
//! - `buffer`: the per-instance output buffer and line sinks.
//! - `state`: process and call status enums.
//! - `call`: the `PendingCall` future and its settling half.
//! - `dispatch`: the dispatcher task, the exec path and the notification pump.
//!
//! Calls are queued the moment they are made, even if the returned
//! `PendingCall` is never awaited. Dispatch needs a Tokio runtime; outside of
//! one every call fails with `ClapiError::NoRuntime`.
//!
pub mod buffer;
pub mod call;
mod dispatch;
pub mod format;
pub mod state;

use crate::common::process::{NativeHost, ProcessHost, SpawnOptions};
use crate::core::error::ClapiError;
use buffer::{noop_sink, LineSink, OutputBuffer};
use call::{CallReply, PendingCall};
use dispatch::{Dispatcher, Request, Shared};
use format::LineFormatter;
use parking_lot::Mutex;
use state::{CallStatus, ProcessState};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Construction options for a `Wrapper`.
#[derive(Clone)]
pub struct WrapperOptions {
    /// Reuse one long-lived process instead of running the command per call.
    pub persistent: bool,
    /// Prepended to every captured line.
    pub prefix: String,
    /// Working directory for the processes this wrapper starts.
    pub working_dir: Option<PathBuf>,
    /// Receives every line as the buffer is flushed.
    pub sink: LineSink,
}

impl Default for WrapperOptions {
    fn default() -> Self {
        Self {
            persistent: false,
            prefix: String::new(),
            working_dir: None,
            sink: noop_sink(),
        }
    }
}

impl fmt::Debug for WrapperOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperOptions")
            .field("persistent", &self.persistent)
            .field("prefix", &self.prefix)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

impl WrapperOptions {
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_sink(mut self, sink: LineSink) -> Self {
        self.sink = sink;
        self
    }
}

/// Channel ends held by a wrapper once its dispatcher is running.
struct DispatcherLink {
    requests: mpsc::UnboundedSender<Request>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DispatcherLink {
    fn spawn(runtime: &Handle, shared: Arc<Shared>) -> Self {
        let (requests, requests_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(Dispatcher::new(shared, requests_rx, shutdown_rx).run());
        Self {
            requests,
            shutdown,
            task,
        }
    }
}

/// A callable wrapper around one external command.
///
/// Dropping a wrapper lets the calls already queued on it finish, then stops
/// its process in the background. Use [`Wrapper::destroy`] to stop it now.
pub struct Wrapper {
    shared: Arc<Shared>,
    link: Mutex<Option<DispatcherLink>>,
}

impl Wrapper {
    /// Wraps `command`, running it through the native process host.
    pub fn new(command: impl Into<String>, options: WrapperOptions) -> Self {
        Self::with_host(command, options, Arc::new(NativeHost::default()))
    }

    /// Wraps `command`, running it through `host`.
    pub fn with_host(
        command: impl Into<String>,
        options: WrapperOptions,
        host: Arc<dyn ProcessHost>,
    ) -> Self {
        Self::from_parts(command.into(), options, host, OutputBuffer::new())
    }

    /// A new, independent wrapper configured like `other`, starting with a
    /// copy of its buffered lines and no process of its own.
    pub fn from_existing(other: &Wrapper) -> Self {
        other.clone()
    }

    fn from_parts(
        command: String,
        options: WrapperOptions,
        host: Arc<dyn ProcessHost>,
        buffer: OutputBuffer,
    ) -> Self {
        let shared = Shared::new(
            command,
            options.persistent,
            LineFormatter::new(options.prefix),
            buffer,
            options.sink,
            SpawnOptions {
                working_dir: options.working_dir,
            },
            host,
        );
        Self {
            shared: Arc::new(shared),
            link: Mutex::new(None),
        }
    }

    /// Dispatches `command args...`.
    pub fn call<I, S>(&self, args: I) -> PendingCall
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![self.shared.command.clone()];
        argv.extend(args.into_iter().map(Into::into));
        self.dispatch(argv)
    }

    /// Dispatches the bare command with no arguments.
    pub fn run(&self) -> PendingCall {
        self.dispatch(vec![self.shared.command.clone()])
    }

    /// Dispatches `command name args...`.
    pub fn send<I, S>(&self, name: &str, args: I) -> PendingCall
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![self.shared.command.clone(), name.to_string()];
        argv.extend(args.into_iter().map(Into::into));
        self.dispatch(argv)
    }

    /// A callable bound to the sub-command `name`.
    pub fn method(&self, name: impl Into<String>) -> Method<'_> {
        Method {
            wrapper: self,
            name: name.into(),
        }
    }

    fn dispatch(&self, argv: Vec<String>) -> PendingCall {
        let mut link = self.link.lock();
        if link.is_none() {
            let Ok(runtime) = Handle::try_current() else {
                let pending = PendingCall::failed(ClapiError::NoRuntime);
                self.shared.record_call(pending.status_receiver());
                return pending;
            };
            debug!("Starting dispatcher for '{}'", self.shared.command);
            *link = Some(DispatcherLink::spawn(&runtime, Arc::clone(&self.shared)));
        }

        let (reply, pending) = CallReply::channel();
        self.shared.record_call(pending.status_receiver());
        match link.as_ref() {
            Some(link) => {
                if let Err(mpsc::error::SendError(request)) =
                    link.requests.send(Request { argv, reply })
                {
                    request.reply.settle(Err(ClapiError::DispatcherGone));
                }
            }
            None => reply.settle(Err(ClapiError::DispatcherGone)),
        }
        pending
    }

    /// Drains the buffer through this wrapper's sink.
    pub fn flush(&self) -> Vec<String> {
        self.shared.buffer.flush(&*self.shared.sink)
    }

    /// Drains the buffer through `sink` instead of the wrapper's own.
    pub fn flush_with(&self, sink: &dyn Fn(&str)) -> Vec<String> {
        self.shared.buffer.flush(sink)
    }

    /// Lines captured but not yet flushed.
    pub fn buffered(&self) -> Vec<String> {
        self.shared.buffer.snapshot()
    }

    pub fn command(&self) -> &str {
        &self.shared.command
    }

    pub fn prefix(&self) -> &str {
        self.shared.formatter.prefix()
    }

    pub fn is_persistent(&self) -> bool {
        self.shared.persistent
    }

    pub fn process_state(&self) -> ProcessState {
        self.shared.state()
    }

    /// Status of the most recent call, or `None` before the first one.
    pub fn last_call_status(&self) -> Option<CallStatus> {
        self.shared.last_call_status()
    }

    /// Stops the wrapper: calls that have not run yet fail with
    /// `ClapiError::Destroyed`, a connected process is disconnected, and
    /// whatever is left in the buffer is flushed and returned.
    pub async fn destroy(self) -> Vec<String> {
        let link = self.link.lock().take();
        if let Some(DispatcherLink {
            requests,
            shutdown,
            task,
        }) = link
        {
            shutdown.send_replace(true);
            drop(requests);
            if let Err(e) = task.await {
                warn!("Dispatcher for '{}' failed: {}", self.shared.command, e);
            }
        }
        self.flush()
    }
}

impl Clone for Wrapper {
    fn clone(&self) -> Self {
        let options = WrapperOptions {
            persistent: self.shared.persistent,
            prefix: self.shared.formatter.prefix().to_string(),
            working_dir: self.shared.spawn_options.working_dir.clone(),
            sink: Arc::clone(&self.shared.sink),
        };
        Self::from_parts(
            self.shared.command.clone(),
            options,
            Arc::clone(&self.shared.host),
            OutputBuffer::from_lines(self.shared.buffer.snapshot()),
        )
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("command", &self.shared.command)
            .field("prefix", &self.prefix())
            .field("persistent", &self.shared.persistent)
            .field("state", &self.process_state())
            .field("buffered", &self.shared.buffer.len())
            .finish()
    }
}

/// A sub-command of a wrapper, callable on its own.
#[derive(Debug, Clone)]
pub struct Method<'a> {
    wrapper: &'a Wrapper,
    name: String,
}

impl Method<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatches `command name args...`.
    pub fn call<I, S>(&self, args: I) -> PendingCall
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wrapper.send(&self.name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::fake::FakeHost;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn wrapper(command: &str, options: WrapperOptions, host: &Arc<FakeHost>) -> Wrapper {
        Wrapper::with_host(command, options, Arc::clone(host) as Arc<dyn ProcessHost>)
    }

    fn persistent() -> WrapperOptions {
        WrapperOptions::default().with_persistent(true)
    }

    async fn until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition was not reached in time");
    }

    #[tokio::test]
    async fn test_call_joins_command_and_args() {
        let host = Arc::new(FakeHost::default());
        host.push_exec("hello, world\n", "", None);
        let echo = wrapper("echo", WrapperOptions::default().with_prefix("echo: "), &host);

        let lines = echo.call(["hello, world"]).await.unwrap();

        assert_eq!(lines, vec!["echo: hello, world"]);
        assert_eq!(host.exec_lines(), vec!["echo hello, world"]);
        assert_eq!(echo.last_call_status(), Some(CallStatus::Resolved));
        assert_eq!(echo.process_state(), ProcessState::Idle);
    }

    #[tokio::test]
    async fn test_send_and_method_insert_the_name() {
        let host = Arc::new(FakeHost::default());
        let git = wrapper("git", WrapperOptions::default(), &host);

        git.send("log", ["--oneline"]).await.unwrap();
        git.method("status").call(["-s"]).await.unwrap();
        git.run().await.unwrap();

        assert_eq!(host.exec_lines(), vec!["git log --oneline", "git status -s", "git"]);
    }

    #[tokio::test]
    async fn test_exec_stderr_rejects_and_records_status() {
        let host = Arc::new(FakeHost::default());
        host.push_exec("", "ls: cannot access 'nope'\n", None);
        let ls = wrapper("ls", WrapperOptions::default(), &host);

        let error = ls.call(["nope"]).await.unwrap_err();

        assert_eq!(error.lines(), ["ls: cannot access 'nope'".to_string()]);
        assert_eq!(ls.last_call_status(), Some(CallStatus::Rejected));
    }

    #[tokio::test]
    async fn test_nonzero_exit_without_stderr_resolves() {
        let host = Arc::new(FakeHost::default());
        let falsy = wrapper("false", WrapperOptions::default(), &host);
        assert!(falsy.run().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_working_dir_reaches_the_host() {
        let host = Arc::new(FakeHost::default());
        let ls = wrapper(
            "ls",
            WrapperOptions::default().with_working_dir("/tmp"),
            &host,
        );
        ls.run().await.unwrap();
        assert_eq!(
            host.exec_options()[0].working_dir,
            Some(PathBuf::from("/tmp"))
        );
    }

    #[tokio::test]
    async fn test_sink_sees_every_flushed_line() {
        let host = Arc::new(FakeHost::default());
        host.push_exec("one\ntwo\n", "", None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink: LineSink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |line: &str| seen.lock().push(line.to_string()))
        };
        let w = wrapper("x", WrapperOptions::default().with_sink(sink), &host);

        w.run().await.unwrap();

        assert_eq!(*seen.lock(), vec!["one", "two"]);
        assert!(w.buffered().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_single_argument_passes_empty_string() {
        let host = Arc::new(FakeHost::default());
        let cat = wrapper("cat", persistent(), &host);

        let started = cat.run();
        until(|| !host.processes().is_empty()).await;

        let process = host.process(0);
        assert_eq!(process.program, "cat");
        assert_eq!(process.args, vec![String::new()]);
        assert_eq!(cat.process_state(), ProcessState::Connected);
        process.stdout("ready\n");
        assert_eq!(started.await.unwrap(), vec!["ready"]);
    }

    #[tokio::test]
    async fn test_persistent_start_passes_remaining_args() {
        let host = Arc::new(FakeHost::default());
        let cat = wrapper("cat", persistent(), &host);

        let _started = cat.call(["-", "-u"]);
        until(|| !host.processes().is_empty()).await;

        assert_eq!(host.process(0).args, vec!["-", "-u"]);
    }

    #[tokio::test]
    async fn test_persistent_echo_resolves_second_call() {
        let host = Arc::new(FakeHost::echoing());
        let cat = wrapper("cat", persistent(), &host);

        let started = cat.run();
        let echoed = cat.call(["hello\n"]);

        assert_eq!(echoed.await.unwrap(), vec!["hello"]);
        // Superseded by the write; nothing had been printed yet.
        assert!(started.await.unwrap().is_empty());
        assert_eq!(host.process(0).writes(), vec!["hello\n"]);
    }

    #[tokio::test]
    async fn test_persistent_write_excludes_the_command() {
        let host = Arc::new(FakeHost::echoing());
        let bc = wrapper("bc", persistent(), &host);

        let _started = bc.call(["-q"]);
        bc.send("scale=2;", ["1/3\n"]).await.unwrap();

        assert_eq!(host.process(0).writes(), vec!["scale=2; 1/3\n"]);
    }

    #[tokio::test]
    async fn test_persistent_calls_are_answered_in_order() {
        let host = Arc::new(FakeHost::default());
        let repl = wrapper("repl", persistent(), &host);

        let started = repl.run();
        until(|| !host.processes().is_empty()).await;
        let process = host.process(0);
        process.stdout("> \n");
        assert_eq!(started.await.unwrap(), vec!["> "]);

        let first = repl.call(["a\n"]);
        let second = repl.call(["b\n"]);
        until(|| process.writes().len() == 1).await;
        // The second write waits until the first call has settled.
        tokio::task::yield_now().await;
        assert_eq!(process.writes(), vec!["a\n"]);

        process.stdout("A\n");
        assert_eq!(first.await.unwrap(), vec!["A"]);
        until(|| process.writes().len() == 2).await;
        process.stdout("B\n");
        assert_eq!(second.await.unwrap(), vec!["B"]);
    }

    #[tokio::test]
    async fn test_persistent_stderr_rejects() {
        let host = Arc::new(FakeHost::default());
        let sh = wrapper("sh", persistent(), &host);

        let started = sh.run();
        until(|| !host.processes().is_empty()).await;
        host.process(0).stderr("sh: bad\n");

        assert_eq!(started.await.unwrap_err().lines(), ["sh: bad".to_string()]);
    }

    #[tokio::test]
    async fn test_exit_terminates_and_next_call_restarts() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("job", persistent().with_prefix("job: "), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;
        host.process(0).exit(Some(3));

        assert_eq!(
            started.await.unwrap(),
            vec!["job: Child process exited with code 3."]
        );
        assert_eq!(w.process_state(), ProcessState::Terminated);

        let restarted = w.call(["again"]);
        until(|| host.processes().len() == 2).await;
        assert_eq!(host.process(1).args, vec!["again"]);
        assert_eq!(w.process_state(), ProcessState::Connected);
        host.process(1).stdout("up\n");
        assert_eq!(restarted.await.unwrap(), vec!["job: up"]);
    }

    #[tokio::test]
    async fn test_spawn_failure_rejects_and_returns_to_idle() {
        let host = Arc::new(FakeHost::failing());
        let w = wrapper("missing", persistent(), &host);

        let error = w.run().await.unwrap_err();

        assert_eq!(error.lines().len(), 1);
        assert!(error.lines()[0].contains("Failed to start 'missing'"));
        assert_eq!(w.process_state(), ProcessState::Idle);
    }

    #[tokio::test]
    async fn test_write_failure_rejects() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("cat", persistent(), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;
        let process = host.process(0);
        process.stdout("ready\n");
        started.await.unwrap();
        process.connected.store(false, Ordering::SeqCst);

        let error = w.call(["x\n"]).await.unwrap_err();

        assert_eq!(
            error.lines(),
            ["Failed to write to process input: process input is closed".to_string()]
        );
    }

    #[tokio::test]
    async fn test_write_failure_after_call_settled_is_buffered() {
        let host = Arc::new(FakeHost::echoing_then_failing());
        let w = wrapper("cat", persistent(), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;

        // The echo settles the call before the write reports its failure.
        assert_eq!(w.call(["stale\n"]).await.unwrap(), vec!["stale"]);
        assert!(started.await.unwrap().is_empty());

        until(|| !w.buffered().is_empty()).await;
        assert_eq!(
            w.buffered(),
            vec!["Failed to write to process input: pipe closed"]
        );
    }

    #[tokio::test]
    async fn test_stderr_after_write_rejects_the_call() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("sh", persistent().with_prefix("sh: "), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;
        let process = host.process(0);
        process.stdout("ready\n");
        started.await.unwrap();

        let bad = w.call(["bad\n"]);
        until(|| process.writes().len() == 1).await;
        process.stderr("bad: not found\n");

        assert_eq!(
            bad.await.unwrap_err().lines(),
            ["sh: bad: not found".to_string()]
        );
        assert_eq!(w.last_call_status(), Some(CallStatus::Rejected));
        assert_eq!(w.process_state(), ProcessState::Connected);
    }

    #[tokio::test]
    async fn test_exit_after_write_resolves_the_call() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("sh", persistent(), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;
        let process = host.process(0);
        process.stdout("ready\n");
        started.await.unwrap();

        let quit = w.call(["exit 1\n"]);
        until(|| process.writes().len() == 1).await;
        process.exit(Some(1));

        assert_eq!(
            quit.await.unwrap(),
            vec!["Child process exited with code 1."]
        );
        assert_eq!(w.process_state(), ProcessState::Terminated);
    }

    #[tokio::test]
    async fn test_destroy_without_process_is_quiet() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("echo", WrapperOptions::default(), &host);
        assert!(w.destroy().await.is_empty());

        let host = Arc::new(FakeHost::default());
        let w = wrapper("cat", persistent(), &host);
        assert!(w.destroy().await.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_disconnects_live_process() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("cat", persistent(), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;
        let process = host.process(0);
        process.stdout("ready\n");
        started.await.unwrap();

        let remaining = w.destroy().await;

        assert_eq!(process.disconnect_count(), 1);
        assert_eq!(remaining, vec!["Child process exited with code 0."]);
    }

    #[tokio::test]
    async fn test_destroy_skips_disconnect_after_exit() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("true", persistent(), &host);

        let started = w.run();
        until(|| !host.processes().is_empty()).await;
        let process = host.process(0);
        process.exit(Some(0));
        started.await.unwrap();

        assert!(w.destroy().await.is_empty());
        assert_eq!(process.disconnect_count(), 0);
    }

    #[tokio::test]
    async fn test_destroy_rejects_calls_that_never_ran() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("echo", WrapperOptions::default(), &host);

        let first = w.call(["a"]);
        let second = w.call(["b"]);
        w.destroy().await;

        assert!(matches!(first.await, Err(ClapiError::Destroyed)));
        assert!(matches!(second.await, Err(ClapiError::Destroyed)));
        assert!(host.exec_lines().is_empty());
    }

    #[tokio::test]
    async fn test_clone_copies_buffer_but_not_process() {
        let host = Arc::new(FakeHost::default());
        let original = wrapper("cat", persistent().with_prefix("> "), &host);
        original.shared.buffer.append(vec!["> kept".to_string()]);

        let copy = Wrapper::from_existing(&original);
        assert_eq!(copy.buffered(), vec!["> kept"]);
        assert_eq!(copy.prefix(), "> ");
        assert!(copy.is_persistent());

        assert_eq!(original.flush(), vec!["> kept"]);
        assert_eq!(copy.buffered(), vec!["> kept"]);

        let _started = copy.run();
        until(|| !host.processes().is_empty()).await;
        assert_eq!(original.process_state(), ProcessState::Idle);
        assert_eq!(copy.process_state(), ProcessState::Connected);
    }

    #[tokio::test]
    async fn test_flush_with_uses_given_sink() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("x", WrapperOptions::default(), &host);
        w.shared.buffer.append(vec!["a".to_string(), "b".to_string()]);

        let seen = Mutex::new(Vec::new());
        let flushed = w.flush_with(&|line| seen.lock().push(line.to_string()));

        assert_eq!(flushed, vec!["a", "b"]);
        assert_eq!(*seen.lock(), vec!["a", "b"]);
        assert!(w.buffered().is_empty());
    }

    #[test]
    fn test_call_outside_runtime_fails_immediately() {
        let host = Arc::new(FakeHost::default());
        let w = wrapper("echo", WrapperOptions::default(), &host);

        let pending = w.call(["hi"]);

        assert_eq!(pending.status(), CallStatus::Rejected);
        assert_eq!(w.last_call_status(), Some(CallStatus::Rejected));
        assert!(host.exec_lines().is_empty());
    }
}
