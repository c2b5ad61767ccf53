//! Newline-delimited JSON-RPC tool server.
//!
//! Requests are read line by line. `tools/call` runs on its own task so slow
//! upstreams never block the reader; every response goes through a single
//! writer task so lines are never interleaved.

pub mod protocol;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ToolError;
use crate::tools::ToolRegistry;
use crate::types::CallToolResult;

use protocol::{
    CallToolParams, CancelledParams, Incoming, RequestId, Response, RpcError, INTERNAL_ERROR,
    INVALID_REQUEST, PARSE_ERROR, PROTOCOL_VERSION,
};

#[derive(Clone)]
pub struct Server {
    registry: Arc<ToolRegistry>,
    in_flight: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
}

impl Server {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve until `reader` reaches EOF, then wait for in-flight calls and
    /// flush their responses.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_loop(writer, rx));
        let mut calls = JoinSet::new();

        info!("Serving {} tools", self.registry.len());

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("Failed to read request")? {
            // Reap finished calls.
            while calls.try_join_next().is_some() {}

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.dispatch(line, &mut calls, &tx).await;
        }

        debug!(pending = calls.len(), "input closed");
        while calls.join_next().await.is_some() {}

        drop(tx);
        writer_task.await.context("Writer task failed")??;
        Ok(())
    }

    async fn dispatch(&self, line: &str, calls: &mut JoinSet<()>, tx: &UnboundedSender<Response>) {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparsable request line");
                send(tx, Response::error(None, RpcError::new(PARSE_ERROR, format!("Parse error: {e}"))));
                return;
            }
        };

        let msg: Incoming = match serde_json::from_value(value.clone()) {
            Ok(m) => m,
            Err(e) => {
                // A response from the client; nothing is waiting for it.
                if value.get("method").is_none()
                    && (value.get("result").is_some() || value.get("error").is_some())
                {
                    return;
                }
                let id = value
                    .get("id")
                    .cloned()
                    .and_then(|v| serde_json::from_value(v).ok());
                send(
                    tx,
                    Response::error(id, RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}"))),
                );
                return;
            }
        };

        match msg.id {
            None => self.handle_notification(&msg.method, msg.params).await,
            Some(id) if msg.method == "tools/call" => {
                self.spawn_call(id, msg.params, calls, tx).await;
            }
            Some(id) => {
                if let Some(resp) = self.handle_request(id, &msg.method, msg.params).await {
                    send(tx, resp);
                }
            }
        }
    }

    /// Answer one request. `None` means the request was cancelled and gets
    /// no response.
    pub async fn handle_request(
        &self,
        id: RequestId,
        method: &str,
        params: Option<Value>,
    ) -> Option<Response> {
        match method {
            "initialize" => Some(Response::success(id, self.initialize_result())),
            "ping" => Some(Response::success(id, json!({}))),
            "tools/list" => Some(Response::success(
                id,
                json!({ "tools": self.registry.definitions() }),
            )),
            "tools/call" => self.call_tool(id, params, CancellationToken::new()).await,
            other => {
                debug!(method = other, "unknown method");
                Some(Response::error(Some(id), RpcError::method_not_found(other)))
            }
        }
    }

    pub async fn handle_notification(&self, method: &str, params: Option<Value>) {
        match method {
            "notifications/initialized" => debug!("client initialized"),
            "notifications/cancelled" => {
                match params.map(serde_json::from_value::<CancelledParams>) {
                    Some(Ok(p)) => match self.in_flight.lock().await.get(&p.request_id) {
                        Some(token) => {
                            info!(request = ?p.request_id, reason = ?p.reason, "cancelling call");
                            token.cancel();
                        }
                        None => debug!(request = ?p.request_id, "cancel for a call that is not running"),
                    },
                    _ => warn!("malformed cancellation notification"),
                }
            }
            other => debug!(method = other, "ignoring notification"),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    async fn spawn_call(
        &self,
        id: RequestId,
        params: Option<Value>,
        calls: &mut JoinSet<()>,
        tx: &UnboundedSender<Response>,
    ) {
        let token = CancellationToken::new();
        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight.contains_key(&id) {
                warn!(id = ?id, "request id already in flight");
                send(
                    tx,
                    Response::error(
                        Some(id),
                        RpcError::new(INVALID_REQUEST, "Invalid request: id is already in flight"),
                    ),
                );
                return;
            }
            in_flight.insert(id.clone(), token.clone());
        }

        let server = self.clone();
        let tx = tx.clone();
        calls.spawn(async move {
            let response = server.call_tool(id.clone(), params, token).await;
            server.in_flight.lock().await.remove(&id);
            if let Some(resp) = response {
                send(&tx, resp);
            }
        });
    }

    async fn call_tool(
        &self,
        id: RequestId,
        params: Option<Value>,
        cancel: CancellationToken,
    ) -> Option<Response> {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return Some(Response::error(
                    Some(id),
                    RpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                ))
            }
            None => {
                return Some(Response::error(
                    Some(id),
                    RpcError::invalid_params("Missing tools/call params"),
                ))
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            let err = ToolError::UnknownTool(params.name);
            warn!(error = %err, "tools/call rejected");
            return Some(Response::error(Some(id), RpcError::invalid_params(err.to_string())));
        };

        // Dropping the execute future aborts any request still in flight.
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ToolError::Cancelled),
            result = tool.execute(params.arguments) => result,
        };

        let result = match outcome {
            Ok(content) => CallToolResult::success(content),
            Err(ToolError::Cancelled) => {
                info!(tool = %params.name, "call cancelled");
                return None;
            }
            Err(e) => CallToolResult::failure(e.to_string()),
        };

        Some(match serde_json::to_value(&result) {
            Ok(v) => Response::success(id, v),
            Err(e) => Response::error(Some(id), RpcError::new(INTERNAL_ERROR, e.to_string())),
        })
    }
}

fn send(tx: &UnboundedSender<Response>, resp: Response) {
    if tx.send(resp).is_err() {
        warn!("writer is gone; dropping response");
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut rx: UnboundedReceiver<Response>,
) -> Result<()> {
    while let Some(resp) = rx.recv().await {
        let mut line = serde_json::to_string(&resp).context("Failed to serialize response")?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
    Ok(())
}
