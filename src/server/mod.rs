//! MCP server over newline-delimited JSON-RPC.
//!
//! Every request runs in its own task; responses are written by a single
//! writer in completion order, so concurrent tool calls may be answered out of
//! order. stdout is reserved for protocol frames.

pub mod protocol;

use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use protocol::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// MCP server exposing a [`ToolRegistry`].
pub struct McpServer {
    registry: ToolRegistry,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, name: &str, version: &str) -> Self {
        Self {
            registry,
            info: ServerInfo {
                name: name.to_string(),
                version: version.to_string(),
            },
        }
    }

    /// Serve stdin/stdout until EOF or cancellation.
    pub async fn serve_stdio(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout, cancel).await
    }

    /// Serve one JSON-RPC message per line from `reader`, answering on `writer`.
    ///
    /// On EOF, in-flight calls are allowed to finish. On cancellation they are
    /// aborted.
    pub async fn serve<R, W>(
        self: Arc<Self>,
        reader: R,
        mut writer: W,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut lines = reader.lines();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, aborting {} in-flight call(s)", in_flight.len());
                    in_flight.abort_all();
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read from transport")? else {
                        debug!("Transport closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let server = self.clone();
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        if let Some(response) = server.handle_message(&line).await {
                            match serde_json::to_string(&response) {
                                Ok(frame) => {
                                    let _ = tx.send(frame);
                                }
                                Err(e) => error!("Failed to serialize response: {}", e),
                            }
                        }
                    });
                }
                Some(frame) = rx.recv() => {
                    write_frame(&mut writer, &frame).await?;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!("Request task panicked: {}", e);
                        }
                    }
                }
            }
        }

        // Remaining senders belong to in-flight tasks; the channel closes when they finish.
        drop(tx);
        if !cancel.is_cancelled() {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Shutdown requested while draining, aborting {} call(s)", in_flight.len());
                        break;
                    }
                    frame = rx.recv() => match frame {
                        Some(frame) => write_frame(&mut writer, &frame).await?,
                        None => break,
                    },
                }
            }
        }
        in_flight.shutdown().await;

        // Calls that finished before the abort still get their answer.
        while let Ok(frame) = rx.try_recv() {
            write_frame(&mut writer, &frame).await?;
        }

        Ok(())
    }

    /// Handle one raw frame. Returns `None` for notifications and stray responses.
    pub async fn handle_message(&self, frame: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(frame) {
            Ok(v) => v,
            Err(e) => {
                warn!("Unparseable frame: {}", e);
                return Some(JsonRpcResponse::failure(Value::Null, RpcError::parse_error(e)));
            }
        };

        let is_reply = value.get("result").is_some() || value.get("error").is_some();
        if value.get("method").is_none() && is_reply {
            debug!("Ignoring client response frame");
            return None;
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let message: JsonRpcMessage = match serde_json::from_value(value) {
            Ok(m) => m,
            Err(e) => return Some(JsonRpcResponse::failure(id, RpcError::invalid_request(e))),
        };

        if message.is_notification() {
            if !message.has_valid_version() {
                warn!("Ignoring notification with bad jsonrpc version: {}", message.method);
            } else {
                debug!("Notification: {}", message.method);
            }
            return None;
        }

        let id = message.id.clone().unwrap_or(Value::Null);
        if !message.has_valid_version() {
            return Some(JsonRpcResponse::failure(
                id,
                RpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }
        if id.is_null() {
            return Some(JsonRpcResponse::failure(
                id,
                RpcError::invalid_request("id must not be null"),
            ));
        }

        let response = match self.dispatch(&message.method, message.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err),
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.definitions() })),
            "tools/call" => self.call_tool(params).await,
            other => Err(RpcError::method_not_found(other)),
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| RpcError::invalid_params(format!("Invalid initialize params: {}", e)))?,
            None => InitializeParams::default(),
        };
        let protocol_version = params
            .protocol_version
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        info!("Client initialized (protocol {})", protocol_version);

        serde_json::to_value(InitializeResult {
            protocol_version,
            capabilities: json!({ "tools": {}, "resources": {} }),
            server_info: self.info.clone(),
        })
        .map_err(RpcError::internal)
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| RpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| RpcError::invalid_params(format!("Tool {} not found", params.name)))?;

        let raw = params.arguments.unwrap_or(Value::Null);
        match tool.invoke(&raw).await {
            Ok(envelope) => serde_json::to_value(envelope).map_err(RpcError::internal),
            Err(e) => {
                warn!("Rejected call to {}: {}", params.name, e);
                Err(RpcError::invalid_params(format!(
                    "Invalid arguments for tool {}: {}",
                    params.name, e
                ))
                .with_data(json!({ "kind": e.kind.to_string(), "field": e.field })))
            }
        }
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &str) -> Result<()> {
    writer
        .write_all(frame.as_bytes())
        .await
        .context("Failed to write to transport")?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::QueryExecutor;
    use crate::groq::CompletionClient;
    use crate::types::{CompletionRequest, CompletionResponse};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, BufReader};

    /// Answers with the question; questions starting with "slow" take longer
    /// and "stall" effectively never returns.
    struct ScriptedClient;

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
            let question = request.messages[0].content.clone();
            if question.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            if question == "stall" {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if question == "fail" {
                anyhow::bail!("connection refused");
            }
            Ok(serde_json::from_value(json!({
                "choices": [{"message": {"content": format!("answer: {}", question)}}]
            }))?)
        }
    }

    fn server() -> Arc<McpServer> {
        let registry = ToolRegistry::groq(QueryExecutor::new(Arc::new(ScriptedClient)));
        Arc::new(McpServer::new(registry, "groq-interaction", "1.0.0"))
    }

    async fn request(server: &McpServer, frame: Value) -> JsonRpcResponse {
        server
            .handle_message(&frame.to_string())
            .await
            .expect("expected a response")
    }

    fn call(id: u64, tool: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments}
        })
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let server = server();
        let resp = request(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {"protocolVersion": "2025-03-26", "capabilities": {}}
            }),
        )
        .await;

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"], json!({"name": "groq-interaction", "version": "1.0.0"}));
        assert!(result["capabilities"]["tools"].is_object());

        let resp = request(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "initialize"})).await;
        assert_eq!(resp.result.unwrap()["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn tools_list_returns_both_tools() {
        let resp = request(&server(), json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "ask_with_realtime_information");
        assert_eq!(tools[1]["name"], "ask_with_code_execution");
        for tool in &tools {
            assert_eq!(tool["inputSchema"]["required"], json!(["question"]));
        }
    }

    #[tokio::test]
    async fn tools_call_returns_envelope() {
        let resp = request(
            &server(),
            call(3, "ask_with_realtime_information", json!({"question": "weather"})),
        )
        .await;
        assert_eq!(resp.id, json!(3));
        assert_eq!(
            resp.result.unwrap(),
            json!({"content": [{"type": "text", "text": "answer: weather"}]})
        );
    }

    #[tokio::test]
    async fn execution_failure_is_still_a_result() {
        let resp = request(&server(), call(4, "ask_with_code_execution", json!({"question": "fail"}))).await;
        assert!(resp.error.is_none());
        assert_eq!(
            resp.result.unwrap()["content"][0]["text"],
            "Failed to get response from Groq: connection refused"
        );
    }

    #[tokio::test]
    async fn invalid_arguments_are_rejected_before_execution() {
        let resp = request(
            &server(),
            call(5, "ask_with_code_execution", json!({"question": "Q?", "model": "invalid-model"})),
        )
        .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, codes::INVALID_PARAMS);
        assert_eq!(err.data, Some(json!({"kind": "invalid_enum", "field": "model"})));

        let resp = request(&server(), call(6, "ask_with_code_execution", json!({}))).await;
        assert_eq!(resp.error.unwrap().data.unwrap()["kind"], "missing_field");
    }

    #[tokio::test]
    async fn unknown_tool_and_method_are_errors() {
        let resp = request(&server(), call(7, "ask_anything", json!({"question": "Q?"}))).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, codes::INVALID_PARAMS);
        assert!(err.message.contains("ask_anything"));

        let resp = request(&server(), json!({"jsonrpc": "2.0", "id": 8, "method": "resources/read"})).await;
        assert_eq!(resp.error.unwrap().code, codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn notifications_and_garbage() {
        let server = server();
        let none = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(none.is_none());

        let resp = server.handle_message("{not json").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, codes::PARSE_ERROR);

        let resp = server.handle_message(r#"{"jsonrpc":"2.0","id":9}"#).await.unwrap();
        assert_eq!(resp.id, json!(9));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn null_id_and_bad_version_are_invalid_requests() {
        let server = server();

        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .expect("null id must be answered");
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, codes::INVALID_REQUEST);

        let resp = server
            .handle_message(r#"{"jsonrpc":"1.0","id":10,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(resp.id, json!(10));
        assert_eq!(resp.error.unwrap().code, codes::INVALID_REQUEST);

        let resp = server.handle_message(r#"{"id":11,"method":"ping"}"#).await.unwrap();
        assert_eq!(resp.error.unwrap().code, codes::INVALID_REQUEST);

        assert!(server.handle_message(r#"{"method":"notifications/initialized"}"#).await.is_none());
    }

    #[tokio::test]
    async fn serve_answers_concurrent_calls_in_completion_order() {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);

        let handle = tokio::spawn(server().serve(
            BufReader::new(server_in),
            server_out,
            CancellationToken::new(),
        ));

        let frames = [
            call(1, "ask_with_realtime_information", json!({"question": "slow news"})),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            call(2, "ask_with_code_execution", json!({"question": "2+2"})),
        ];
        for frame in &frames {
            client_in.write_all(format!("{}\n", frame).as_bytes()).await.unwrap();
        }
        drop(client_in);

        handle.await.unwrap().unwrap();

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, json!(2));
        assert_eq!(responses[0].result.as_ref().unwrap()["content"][0]["text"], "answer: 2+2");
        assert_eq!(responses[1].id, json!(1));
        assert_eq!(
            responses[1].result.as_ref().unwrap()["content"][0]["text"],
            "answer: slow news"
        );
    }

    #[tokio::test]
    async fn cancellation_stops_serving() {
        let (_client_in, server_in) = tokio::io::duplex(1024);
        let (server_out, _client_out) = tokio::io::duplex(1024);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(server().serve(BufReader::new(server_in), server_out, cancel.clone()));
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }

    async fn read_responses(mut out: tokio::io::DuplexStream) -> Vec<JsonRpcResponse> {
        let mut output = String::new();
        out.read_to_string(&mut output).await.unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_calls() {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, client_out) = tokio::io::duplex(64 * 1024);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(server().serve(BufReader::new(server_in), server_out, cancel.clone()));
        let frame = call(1, "ask_with_realtime_information", json!({"question": "stall"}));
        client_in.write_all(format!("{}\n", frame).as_bytes()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
        assert!(read_responses(client_out).await.is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_drain_after_eof() {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, client_out) = tokio::io::duplex(64 * 1024);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(server().serve(BufReader::new(server_in), server_out, cancel.clone()));
        for frame in [
            call(1, "ask_with_realtime_information", json!({"question": "stall"})),
            call(2, "ask_with_code_execution", json!({"question": "2+2"})),
        ] {
            client_in.write_all(format!("{}\n", frame).as_bytes()).await.unwrap();
        }
        drop(client_in);

        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();

        let responses = read_responses(client_out).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, json!(2));
    }
}
