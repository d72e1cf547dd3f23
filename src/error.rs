//! Error types for the Entra ID MCP server.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Entra ID MCP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Entra ID MCP server.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Graph Errors =====
    #[error("Graph API error: {status} {code} - {message}")]
    Graph {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // ===== MCP Errors =====
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    // ===== I/O Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== HTTP Errors =====
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP server error: {0}")]
    HttpServer(String),

    // ===== Internal Errors =====
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification reported to MCP clients when a tool fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Remote,
    Validation,
    NotFound,
    Internal,
}

impl Error {
    /// Create a Graph error from an HTTP status and OData error body fields.
    pub fn graph(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Graph {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Classify this error for the tool failure payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Graph { status: 404, .. } | Self::NotFound(_) => ErrorKind::NotFound,
            Self::Graph { status: 401, .. } | Self::Auth(_) | Self::Certificate(_) => {
                ErrorKind::Authentication
            }
            Self::Graph { .. } | Self::Http(_) => ErrorKind::Remote,
            Self::Validation(_) | Self::InvalidToolArguments(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// HTTP status returned by Graph, when the failure came from a Graph response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Graph { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// OData error code, when available.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Graph { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if Graph rejected the call for lack of permissions.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Graph { status, code, .. } => {
                *status == 403 || code == "Authorization_RequestDenied"
            }
            _ => false,
        }
    }

    /// Render the JSON payload carried by a failed tool result.
    pub fn to_payload(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(status) = self.status() {
            body["status"] = status.into();
        }
        if let Some(code) = self.code() {
            body["code"] = code.into();
        }
        serde_json::json!({ "error": body })
    }
}
