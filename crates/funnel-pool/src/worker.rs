//! Worker Child Processes
//!
//! A [`Worker`] wraps one language-runtime child process bound to a
//! reserved local port. It owns the process handle, a dedicated HTTP client
//! for talking to the child, and two line buffers capturing the child's
//! stdout and stderr for the current invocation.
//!
//! # Lifecycle
//!
//! Created (by a factory) → Running ([`start`](Worker::start) spawned the
//! child and its two log-scan tasks) → Terminated
//! ([`terminate`](Worker::terminate), e.g. after a timeout) or Shut down
//! ([`shutdown`](Worker::shutdown)). A worker is never reused after
//! termination; the dispatcher substitutes a freshly built worker on the
//! same port.
//!
//! # Concurrency
//!
//! At most one `invoke` runs on a worker at a time — the dispatcher
//! enforces this by checking workers out exclusively. The log-scan tasks
//! run concurrently with invocations; buffer access is serialised by a
//! read-write lock which is never held across I/O.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use funnel_common::protocol::{Envelope, Fault, FaultKind, FunnelError, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

#[derive(Debug, Default)]
struct CapturedLines {
    stdout: Vec<String>,
    stderr: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

/// Line buffers for one worker, shared with its log-scan tasks. A single
/// lock guards both streams so an invocation clears them atomically; it is
/// only ever held for the push/snapshot itself, never across I/O.
#[derive(Debug, Default)]
struct StreamBuffers {
    lines: RwLock<CapturedLines>,
}

impl StreamBuffers {
    fn push(&self, kind: StreamKind, line: String) {
        let mut lines = self.lines.write().unwrap_or_else(|e| e.into_inner());
        match kind {
            StreamKind::Stdout => lines.stdout.push(line),
            StreamKind::Stderr => lines.stderr.push(line),
        }
    }

    fn snapshot(&self, kind: StreamKind) -> Vec<String> {
        let lines = self.lines.read().unwrap_or_else(|e| e.into_inner());
        match kind {
            StreamKind::Stdout => lines.stdout.clone(),
            StreamKind::Stderr => lines.stderr.clone(),
        }
    }

    fn clear(&self) {
        let mut lines = self.lines.write().unwrap_or_else(|e| e.into_inner());
        lines.stdout.clear();
        lines.stderr.clear();
    }
}

/// Reads a pipe line by line until EOF, committing each complete line to
/// the shared buffer. A partial trailing line at EOF is committed as a
/// final line.
async fn scan_stream<R>(reader: R, buffers: Arc<StreamBuffers>, kind: StreamKind)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => buffers.push(kind, line),
            Ok(None) => break,
            Err(err) => {
                debug!(%err, "log capture stopped");
                break;
            }
        }
    }
}

/// One managed worker child process.
pub struct Worker {
    port: u16,
    command: Vec<String>,
    client: reqwest::Client,
    child: Option<Child>,
    streams: Arc<StreamBuffers>,
}

impl Worker {
    /// Builds a worker pinned to `port` that will run `command` when
    /// started. `command` is the argv vector; it must not be empty.
    ///
    /// # Errors
    ///
    /// `IllegalArgument` for ports below 1024 (reserved range) or an empty
    /// argv.
    pub fn new(port: u16, command: Vec<String>) -> Result<Self> {
        if port < 1024 {
            return Err(FunnelError::IllegalArgument(format!(
                "worker port must be at least 1024, got {port}"
            )));
        }
        if command.is_empty() {
            return Err(FunnelError::IllegalArgument(
                "worker command is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FunnelError::UnknownSystem(e.to_string()))?;
        Ok(Self {
            port,
            command,
            client,
            child: None,
            streams: Arc::new(StreamBuffers::default()),
        })
    }

    /// The reserved port. Stable for the worker's lifetime.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Spawns the child process and the two log-scan tasks.
    ///
    /// The child inherits this process's environment with `PORT` set to the
    /// reserved port. Its stdout and stderr are piped and scanned line by
    /// line until EOF.
    ///
    /// # Errors
    ///
    /// `IllegalState` if the worker was already started; the spawn error if
    /// the child could not be created — the worker must not be used after
    /// that.
    pub fn start(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Err(FunnelError::IllegalState(format!(
                "worker on port {} is already started",
                self.port
            )));
        }

        let mut command = Command::new(&self.command[0]);
        command
            .args(&self.command[1..])
            .env("PORT", self.port.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FunnelError::UnknownSystem("worker stdout pipe unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FunnelError::UnknownSystem("worker stderr pipe unavailable".into()))?;

        tokio::spawn(scan_stream(
            stdout,
            Arc::clone(&self.streams),
            StreamKind::Stdout,
        ));
        tokio::spawn(scan_stream(
            stderr,
            Arc::clone(&self.streams),
            StreamKind::Stderr,
        ));

        self.child = Some(child);
        debug!(port = self.port, command = ?self.command, "worker child started");
        Ok(())
    }

    /// Performs one invocation against the child.
    ///
    /// Clears the log buffers, POSTs the envelope as JSON to
    /// `http://127.0.0.1:<port>/` and interprets the reply. The deadline is
    /// taken from the envelope's `timeout` context entry; zero means no
    /// deadline.
    ///
    /// # Errors
    ///
    /// - `Timeout` — the call exceeded the configured deadline
    /// - `ConnectionRefused` — the child is not listening
    /// - `FunctionServer` — the child replied with status ≥ 400; the fault
    ///   is decoded from the body (best effort)
    /// - `InvalidResponsePayload` — the reply body is not valid JSON
    /// - `UnknownSystem` — any other transport fault
    pub async fn invoke(&self, envelope: &Envelope) -> Result<Value> {
        self.streams.clear();

        let timeout_ms = envelope.timeout_ms();
        let url = format!("http://127.0.0.1:{}/", self.port);
        let mut request = self.client.post(&url).json(envelope);
        if timeout_ms > 0 {
            request = request.timeout(Duration::from_millis(timeout_ms));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return Err(FunnelError::Timeout(timeout_ms)),
            Err(err) if err.is_connect() => {
                return Err(FunnelError::ConnectionRefused(self.port))
            }
            Err(err) => return Err(FunnelError::UnknownSystem(err.to_string())),
        };

        if response.status().as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            let fault = serde_json::from_str(&body).unwrap_or_else(|_| {
                Fault::new(FaultKind::FunctionError, body.trim().to_string())
            });
            return Err(FunnelError::FunctionServer(fault));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FunnelError::UnknownSystem(e.to_string()))?;
        serde_json::from_slice(&body)
            .map_err(|e| FunnelError::InvalidResponsePayload(e.to_string()))
    }

    /// Snapshot of the stdout lines captured since the last `invoke`.
    pub fn stdout(&self) -> Vec<String> {
        self.streams.snapshot(StreamKind::Stdout)
    }

    /// Snapshot of the stderr lines captured since the last `invoke`.
    pub fn stderr(&self) -> Vec<String> {
        self.streams.snapshot(StreamKind::Stderr)
    }

    /// Kills the child without waiting. Idempotent: a child that already
    /// exited (or was never started) is not an error.
    pub fn terminate(&mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };
        match child.start_kill() {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Waits for the child to exit; a non-zero termination escalates to a
    /// kill. Returns the child's final disposition.
    pub async fn shutdown(&mut self) -> Result<ExitStatus> {
        let Some(mut child) = self.child.take() else {
            return Err(FunnelError::IllegalState(
                "worker was never started".to_string(),
            ));
        };
        match child.wait().await {
            Ok(status) => {
                if !status.success() {
                    let _ = child.start_kill();
                }
                Ok(status)
            }
            Err(err) => {
                let _ = child.start_kill();
                Err(err.into())
            }
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("port", &self.port)
            .field("command", &self.command)
            .field("running", &self.child.is_some())
            .finish()
    }
}
