//! Stdio transport for MCP server communication.
//!
//! Spawns a child process and manages async communication over stdin/stdout
//! using newline-delimited JSON-RPC messages.

use crate::error::McpError;
use crate::jsonrpc::{JsonRpcIncoming, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Async stdio transport for communicating with an MCP server process.
pub struct StdioTransport {
    server: String,
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    stderr_handle: JoinHandle<()>,
    child: Arc<Mutex<Child>>,
    timeout_ms: u64,
}

impl StdioTransport {
    /// Spawn a child process and start the background reader/writer tasks.
    ///
    /// The reader is running before anything is written, so no reply can be
    /// missed. `env` is merged over the parent environment.
    pub fn spawn(
        server: &str,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout_ms: u64,
    ) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: server.to_string(),
            source: e,
        })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        // Writer task: drains the channel and writes to child stdin. Routing
        // every write through one task keeps envelope frames from interleaving.
        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                if stdin.write_all(msg.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        // Reader task: reads lines from stdout, classifies each at the parse
        // boundary, and resolves the matching pending entry. When the stream
        // closes, every in-flight request is failed immediately instead of
        // waiting out its own timeout.
        let pending_for_reader = Arc::clone(&pending);
        let closed_for_reader = Arc::clone(&closed);
        let reader_server = server.to_string();
        let reader_handle = tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let incoming: JsonRpcIncoming = match serde_json::from_str(&line) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::warn!("Unparseable line from '{reader_server}': {e}: {line}");
                        continue;
                    }
                };
                match incoming {
                    JsonRpcIncoming::Response(resp) => {
                        let mut pending = pending_for_reader.lock().await;
                        if let Some(tx) = pending.remove(&resp.id) {
                            let _ = tx.send(resp);
                        } else {
                            tracing::debug!(
                                "Discarding reply with unknown id {} from '{reader_server}'",
                                resp.id
                            );
                        }
                    }
                    JsonRpcIncoming::Notification(note) => {
                        tracing::debug!(
                            "Ignoring notification '{}' from '{reader_server}'",
                            note.method
                        );
                    }
                    JsonRpcIncoming::Request(req) => {
                        tracing::warn!(
                            "Dropping unsupported server-initiated request '{}' (id {}) from '{reader_server}'",
                            req.method,
                            req.id
                        );
                    }
                }
            }
            closed_for_reader.store(true, Ordering::SeqCst);
            pending_for_reader.lock().await.clear();
        });

        // Stderr drain: the pipe must be consumed or the child can block on it.
        let stderr_server = server.to_string();
        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    tracing::debug!("[{stderr_server}] stderr: {line}");
                }
            }
        });

        Ok(Self {
            server: server.to_string(),
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            closed,
            reader_handle,
            writer_handle,
            stderr_handle,
            child: Arc::new(Mutex::new(child)),
            timeout_ms,
        })
    }

    /// Whether the reader has observed stream closure.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a JSON-RPC request and wait for the correlated response.
    pub async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        if self.is_closed() {
            return Err(McpError::ConnectionClosed {
                server: self.server.clone(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        let serialized = serde_json::to_string(&request)?;

        // Register before writing so the reply cannot race the registration.
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        if self.write_tx.send(serialized).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(McpError::ConnectionClosed {
                server: self.server.clone(),
            });
        }

        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), rx).await {
            Ok(Ok(resp)) => Ok(resp),
            // The sender was dropped without a reply: the reader drained the
            // pending table after observing stream closure.
            Ok(Err(_)) => Err(McpError::ConnectionClosed {
                server: self.server.clone(),
            }),
            Err(_) => {
                // Evict the entry so a late reply is discarded, not delivered.
                self.pending.lock().await.remove(&id);
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms: self.timeout_ms,
                })
            }
        }
    }

    /// Send a JSON-RPC notification (fire-and-forget, no response expected).
    pub async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        let serialized = serde_json::to_string(&notification)?;

        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| McpError::ConnectionClosed {
                server: self.server.clone(),
            })?;

        Ok(())
    }

    /// Shut down the transport: close stdin, wait briefly, then kill.
    pub async fn shutdown(self) {
        // Unblock in-flight callers right away.
        self.closed.store(true, Ordering::SeqCst);
        self.pending.lock().await.clear();

        // Drop the write channel: the writer task exits and the child sees
        // EOF on stdin, the stdio-transport termination request.
        drop(self.write_tx);

        let child = self.child;

        // Give the child 5 seconds to exit gracefully
        let graceful = tokio::time::timeout(Duration::from_secs(5), async {
            let mut child = child.lock().await;
            let _ = child.wait().await;
        })
        .await;

        if graceful.is_err() {
            // Force kill if it didn't exit
            let mut child = child.lock().await;
            let _ = child.kill().await;
        }

        self.reader_handle.abort();
        self.writer_handle.abort();
        self.stderr_handle.abort();
    }
}
