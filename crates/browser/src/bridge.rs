//! Playwright bridge session
//!
//! A [`BrowserSession`] owns one `node` subprocess running the embedded
//! bridge script (`bridge.js`), which holds a browser, context and page for
//! the whole session. Commands go over stdin as newline-delimited JSON and
//! replies come back on stdout, correlated by id.
//!
//! The subprocess is spawned with `kill_on_drop`, so dropping the session
//! (including on an early `?` return or a panic) always releases the browser.
//! [`BrowserSession::close`] is the graceful path: it closes page, context
//! and browser in order before the process exits.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Id of the unsolicited readiness reply the bridge emits on startup.
const READY_ID: u64 = 0;

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Upper bound for a single bridge command round-trip.
    pub command_timeout: Duration,
    /// Upper bound for browser startup.
    pub launch_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            command_timeout: Duration::from_secs(30),
            launch_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

type PendingMap = Arc<parking_lot::Mutex<HashMap<u64, oneshot::Sender<BridgeReply>>>>;

/// One browser session backed by a Playwright bridge subprocess.
pub struct BrowserSession {
    child: Child,
    stdin: Mutex<ChildStdin>,
    pending: PendingMap,
    next_id: AtomicU64,
    command_timeout: Duration,
    // Keeps the bridge script on disk for the lifetime of the session.
    _bridge_dir: tempfile::TempDir,
}

impl BrowserSession {
    /// Spawn the bridge and wait for the browser to come up.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        Self::check_node_installed()?;

        let bridge_dir = tempfile::tempdir()?;
        let script_path = bridge_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let mut child = Command::new("node")
            .arg(&script_path)
            .env("NODEHARNESS_HEADLESS", if config.headless { "1" } else { "0" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::Bridge(format!("failed to spawn node: {e}")))?;

        let stdin = child.stdin.take().ok_or(BrowserError::BridgeClosed)?;
        let stdout = child.stdout.take().ok_or(BrowserError::BridgeClosed)?;
        let stderr = child.stderr.take().ok_or(BrowserError::BridgeClosed)?;

        let pending: PendingMap = Arc::new(parking_lot::Mutex::new(HashMap::new()));

        // Register the readiness reply before the reader can race it.
        let (ready_tx, ready_rx) = oneshot::channel();
        pending.lock().insert(READY_ID, ready_tx);

        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<BridgeReply>(&line) {
                    Ok(reply) => {
                        if let Some(tx) = reader_pending.lock().remove(&reply.id) {
                            let _ = tx.send(reply);
                        } else {
                            debug!(id = reply.id, "unmatched bridge reply");
                        }
                    }
                    Err(_) => debug!(%line, "non-protocol bridge output"),
                }
            }
            // Reader gone: fail everything still waiting.
            reader_pending.lock().clear();
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "bridge", %line);
            }
        });

        match tokio::time::timeout(config.launch_timeout, ready_rx).await {
            Ok(Ok(reply)) if reply.ok => info!("browser session ready"),
            Ok(_) => return Err(BrowserError::BridgeClosed),
            Err(_) => return Err(BrowserError::timeout("browser startup", config.launch_timeout)),
        }

        Ok(Self {
            child,
            stdin: Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
            command_timeout: config.command_timeout,
            _bridge_dir: bridge_dir,
        })
    }

    fn check_node_installed() -> Result<()> {
        let status = std::process::Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => Ok(()),
            _ => Err(BrowserError::NodeNotFound),
        }
    }

    /// Send one command and wait for its reply.
    async fn command(&self, mut payload: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        payload["id"] = json!(id);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut stdin = self.stdin.lock().await;
            let line = serde_json::to_string(&payload)?;
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
        }

        // Command timeout plus slack so the bridge's own timeout fires first.
        let wait = self.command_timeout + Duration::from_secs(5);
        let reply = match tokio::time::timeout(wait, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(BrowserError::BridgeClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                return Err(BrowserError::timeout(
                    format!("bridge reply to {}", payload["op"]),
                    wait,
                ));
            }
        };

        if reply.ok {
            Ok(reply.value.unwrap_or(Value::Null))
        } else {
            Err(BrowserError::Bridge(
                reply.error.unwrap_or_else(|| "unknown bridge error".to_string()),
            ))
        }
    }

    /// Gracefully close page, context and browser, then reap the process.
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.command(json!({ "op": "close" })).await {
            warn!(error = %e, "graceful close failed, terminating bridge");
            self.terminate();
        }
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => {
                self.terminate();
                let _ = self.child.wait().await;
                Ok(())
            }
        }
    }

    /// SIGTERM the bridge, falling back to SIGKILL.
    fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }
        let _ = self.child.start_kill();
    }

    fn timeout_ms(&self) -> u64 {
        self.command_timeout.as_millis() as u64
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.command(json!({ "op": "goto", "url": url })).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.command(json!({ "op": "fill", "selector": selector, "value": value }))
            .await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.command(json!({
            "op": "click",
            "selector": selector,
            "timeout_ms": self.timeout_ms(),
        }))
        .await?;
        Ok(())
    }

    async fn try_click(&self, selector: &str) -> Result<bool> {
        let value = self
            .command(json!({
                "op": "try_click",
                "selector": selector,
                "timeout_ms": 2_000,
            }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let value = self
            .command(json!({ "op": "is_visible", "selector": selector }))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let value = self
            .command(json!({ "op": "texts", "selector": selector }))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn input_value(&self, selector: &str) -> Result<Option<String>> {
        let value = self
            .command(json!({ "op": "input_value", "selector": selector }))
            .await?;
        Ok(match value {
            Value::Null => None,
            other => other.as_str().map(str::to_string),
        })
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        self.command(json!({
            "op": "select_option",
            "selector": selector,
            "value": value,
        }))
        .await?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let result = self
            .command(json!({
                "op": "wait_for",
                "selector": selector,
                "timeout_ms": timeout.as_millis() as u64,
            }))
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(BrowserError::Bridge(msg)) if msg.contains("Timeout") => {
                Err(BrowserError::timeout(selector.to_string(), timeout))
            }
            Err(e) => Err(e),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.command(json!({ "op": "evaluate", "script": script })).await
    }

    async fn scroll_by(&self, y: i64) -> Result<()> {
        self.command(json!({ "op": "scroll_by", "y": y })).await?;
        Ok(())
    }
}
