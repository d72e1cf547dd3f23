//! MCP server implementation.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::mcp::context::ToolContext;
use crate::mcp::handler::McpHandler;
use crate::mcp::protocol::*;
use crate::mcp::resources::ResourceRegistry;
use crate::mcp::transport::{Message, Transport};
use crate::VERSION;

const INSTRUCTIONS: &str = "Tools for querying and managing Microsoft Entra ID through Microsoft Graph: \
users, groups, sign-in and audit logs, MFA status, managed devices, conditional access policies, \
password resets, permissions, applications and service principals. Failed calls return a JSON \
error payload with isError set.";

#[derive(Deserialize)]
struct CancelledParams {
    #[serde(rename = "requestId")]
    request_id: RequestId,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// Map a failed request to its JSON-RPC error.
fn rpc_error(method: &str, err: &Error) -> JsonRpcError {
    let code = match err {
        Error::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
        Error::ToolNotFound(_) | Error::InvalidToolArguments(_) => error_codes::INVALID_PARAMS,
        _ if method == "resources/read" => match err.kind() {
            ErrorKind::NotFound => error_codes::RESOURCE_NOT_FOUND,
            ErrorKind::Validation => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        },
        _ => error_codes::INTERNAL_ERROR,
    };
    JsonRpcError::new(code, err.to_string())
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.ok_or_else(|| Error::InvalidToolArguments("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| Error::InvalidToolArguments(e.to_string()))
}

/// MCP server.
pub struct McpServer {
    handler: Arc<McpHandler>,
    resources: Option<Arc<ResourceRegistry>>,
    name: String,
    version: String,
    /// Requests in flight; a cancelled request is removed before it completes.
    active_requests: RwLock<HashSet<RequestId>>,
}

impl McpServer {
    /// Create a server exposing tools only.
    pub fn new(handler: McpHandler, name: impl Into<String>) -> Self {
        Self {
            handler: Arc::new(handler),
            resources: None,
            name: name.into(),
            version: VERSION.to_string(),
            active_requests: RwLock::new(HashSet::new()),
        }
    }

    /// Add resource templates.
    pub fn with_resources(mut self, resources: ResourceRegistry) -> Self {
        self.resources = Some(Arc::new(resources));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Arc<McpHandler> {
        &self.handler
    }

    /// Check if a request is no longer in flight.
    pub async fn is_cancelled(&self, id: &RequestId) -> bool {
        !self.active_requests.read().await.contains(id)
    }

    /// Run the server with the given transport until the input closes.
    ///
    /// Each request runs on its own task so a slow Graph call does not hold
    /// up `ping` or a cancellation.
    pub async fn run<T: Transport>(self: Arc<Self>, mut transport: T) -> Result<()> {
        info!("Starting MCP server: {} v{}", self.name, self.version);

        let (mut incoming, outgoing) = transport.start().await?;

        while let Some(msg) = incoming.recv().await {
            match msg {
                Message::Request(req) => {
                    let server = Arc::clone(&self);
                    let outgoing = outgoing.clone();
                    tokio::spawn(async move {
                        if let Some(response) = server.handle_request(req, Some(outgoing.clone())).await {
                            if outgoing.send(Message::Response(response)).await.is_err() {
                                error!("Failed to send response");
                            }
                        }
                    });
                }
                Message::Notification(notif) => {
                    self.handle_notification(notif).await;
                }
                Message::Response(res) => {
                    warn!("Ignoring unexpected response (id: {})", res.id);
                }
            }
        }

        transport.stop().await?;
        info!("MCP server stopped");
        Ok(())
    }

    /// Handle a JSON-RPC request.
    ///
    /// `notifier` carries tool log and progress notifications back to the
    /// client. Returns `None` when the client cancelled the request.
    pub async fn handle_request(
        &self,
        req: JsonRpcRequest,
        notifier: Option<mpsc::Sender<Message>>,
    ) -> Option<JsonRpcResponse> {
        debug!("Handling request: {} (id: {})", req.method, req.id);

        self.active_requests.write().await.insert(req.id.clone());

        let result = match req.method.as_str() {
            "initialize" => self.handle_initialize(),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(req.params, notifier).await,
            "resources/list" => self.handle_list_resources(),
            "resources/templates/list" => self.handle_list_resource_templates(),
            "resources/read" => self.handle_read_resource(req.params).await,
            other => Err(Error::MethodNotFound(other.to_string())),
        };

        if !self.active_requests.write().await.remove(&req.id) {
            info!("Dropping response to cancelled request {}", req.id);
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(req.id, value),
            Err(e) => {
                debug!("Request {} failed: {}", req.method, e);
                JsonRpcResponse::failure(req.id, rpc_error(&req.method, &e))
            }
        })
    }

    /// Handle a notification.
    pub async fn handle_notification(&self, notif: JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                info!("Client initialized");
            }
            "notifications/cancelled" => match parse_params::<CancelledParams>(notif.params) {
                Ok(cancel) => {
                    info!(
                        "Cancelling request {} ({})",
                        cancel.request_id,
                        cancel.reason.as_deref().unwrap_or("no reason given")
                    );
                    self.active_requests.write().await.remove(&cancel.request_id);
                }
                Err(e) => warn!("Malformed cancellation: {}", e),
            },
            other => {
                debug!("Unhandled notification: {}", other);
            }
        }
    }

    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
                resources: self.resources.as_ref().map(|_| ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
                logging: Some(LoggingCapability {}),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.handler.list_tools(),
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_call_tool(
        &self,
        params: Option<Value>,
        notifier: Option<mpsc::Sender<Message>>,
    ) -> Result<Value> {
        let params: CallToolParams = parse_params(params)?;
        let progress_token = params.meta.and_then(|m| m.progress_token);
        let ctx = ToolContext::new(params.name.clone(), progress_token, notifier);

        let result = self.handler.call(&params.name, params.arguments, &ctx).await?;
        Ok(serde_json::to_value(result)?)
    }

    fn registry(&self) -> Result<&Arc<ResourceRegistry>> {
        self.resources
            .as_ref()
            .ok_or_else(|| Error::MethodNotFound("resources are not enabled".to_string()))
    }

    fn handle_list_resources(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.registry()?.list())?)
    }

    fn handle_list_resource_templates(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.registry()?.templates())?)
    }

    async fn handle_read_resource(&self, params: Option<Value>) -> Result<Value> {
        let registry = self.registry()?;
        let params: ReadResourceParams = parse_params(params)?;
        let result = registry.read(&params.uri).await?;
        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(McpHandler::new(Metrics::new()), "EntraID MCP Server")
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_request(request(1, "initialize", Some(json!({}))), None)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert_eq!(result["serverInfo"]["name"], "EntraID MCP Server");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"].get("resources").is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let response = server().handle_request(request(2, "ping", None), None).await.unwrap();
        assert_eq!(response.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_request(request(3, "prompts/list", None), None)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let params = json!({"name": "does_not_exist", "arguments": {}});
        let response = server()
            .handle_request(request(4, "tools/call", Some(params)), None)
            .await
            .unwrap();
        let err = response.error.unwrap();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert!(err.message.contains("does_not_exist"));
    }

    #[tokio::test]
    async fn test_call_without_params() {
        let response = server()
            .handle_request(request(5, "tools/call", None), None)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_resources_disabled() {
        let response = server()
            .handle_request(request(6, "resources/templates/list", None), None)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancellation_removes_request() {
        let server = server();
        let id = RequestId::String("slow".to_string());
        server.active_requests.write().await.insert(id.clone());
        assert!(!server.is_cancelled(&id).await);

        server
            .handle_notification(JsonRpcNotification::new(
                "notifications/cancelled",
                json!({"requestId": "slow", "reason": "user abort"}),
            ))
            .await;
        assert!(server.is_cancelled(&id).await);
    }

    #[test]
    fn test_rpc_error_mapping() {
        let not_found = Error::not_found("Unknown resource: x://y");
        assert_eq!(rpc_error("resources/read", &not_found).code, error_codes::RESOURCE_NOT_FOUND);
        assert_eq!(rpc_error("tools/list", &not_found).code, error_codes::INTERNAL_ERROR);
        assert_eq!(
            rpc_error("tools/call", &Error::ToolNotFound("x".into())).code,
            error_codes::INVALID_PARAMS
        );
        assert_eq!(
            rpc_error("resources/read", &Error::graph(500, "x", "y")).code,
            error_codes::INTERNAL_ERROR
        );
    }
}
