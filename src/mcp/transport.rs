//! Line-delimited JSON-RPC over stdin/stdout.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use crate::error::Result;
use crate::mcp::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

const CHANNEL_CAPACITY: usize = 100;

/// A message that can be sent or received.
#[derive(Debug, Clone)]
pub enum Message {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

impl Message {
    fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Message::Request(req) => serde_json::to_string(req),
            Message::Response(res) => serde_json::to_string(res),
            Message::Notification(notif) => serde_json::to_string(notif),
        }
    }
}

/// Decode one inbound line. Requests carry an id; notifications do not.
pub fn decode_message(line: &str) -> Option<Message> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    let has_id = value.get("id").is_some_and(|id| !id.is_null());
    if has_id {
        if value.get("method").is_none() {
            // Client answering a server request; this server sends none.
            return serde_json::from_value(value).ok().map(Message::Response);
        }
        serde_json::from_value(value).ok().map(Message::Request)
    } else {
        serde_json::from_value(value).ok().map(Message::Notification)
    }
}

/// Transport trait for MCP communication.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start the transport, returning the inbound receiver and outbound sender.
    async fn start(&mut self) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<Message>)>;

    /// Stop the transport.
    async fn stop(&mut self) -> Result<()>;
}

/// Stdio transport for MCP.
#[derive(Debug, Default)]
pub struct StdioTransport {
    running: bool,
}

impl StdioTransport {
    /// Create a new stdio transport.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(&mut self) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<Message>)> {
        self.running = true;

        let (inbound_tx, inbound_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut reader = BufReader::new(tokio::io::stdin());
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!("stdin closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        trace!("<- {}", trimmed);

                        match decode_message(trimmed) {
                            Some(msg) => {
                                if inbound_tx.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            None => warn!("Ignoring malformed message: {}", trimmed),
                        }
                    }
                    Err(e) => {
                        error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        // stdout carries protocol frames only; logs go to stderr.
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();

            while let Some(msg) = outbound_rx.recv().await {
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Error serializing message: {}", e);
                        continue;
                    }
                };
                trace!("-> {}", json);

                let written = async {
                    stdout.write_all(json.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await
                };
                if let Err(e) = written.await {
                    error!("Error writing to stdout: {}", e);
                    break;
                }
            }
        });

        Ok((inbound_rx, outbound_tx))
    }

    async fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;

    #[test]
    fn test_decode_request() {
        let msg = decode_message(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#);
        match msg {
            Some(Message::Request(req)) => {
                assert_eq!(req.id, RequestId::Number(3));
                assert_eq!(req.method, "tools/list");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_notification() {
        let msg = decode_message(
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"a"}}"#,
        );
        assert!(matches!(msg, Some(Message::Notification(n)) if n.method == "notifications/cancelled"));
    }

    #[test]
    fn test_decode_response() {
        let msg = decode_message(r#"{"jsonrpc":"2.0","id":"x","result":{}}"#);
        assert!(matches!(msg, Some(Message::Response(_))));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode_message("not json").is_none());
        assert!(decode_message(r#"{"jsonrpc":"2.0","id":1}"#).is_none());
    }

    #[test]
    fn test_transport_state() {
        let transport = StdioTransport::new();
        assert!(!transport.is_running());
    }
}
