//! Per-call context for tools.
//!
//! Lets a running tool send `notifications/message` log entries and, when
//! the caller supplied a progress token, `notifications/progress` updates.
//! Over HTTP there is no channel back to the client and both become no-ops.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::trace;

use crate::mcp::protocol::{JsonRpcNotification, LogLevel, LoggingMessageParams, ProgressToken};
use crate::mcp::transport::Message;

/// Progress notification params.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressParams {
    pub progress_token: ProgressToken,
    pub progress: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Context handed to every tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    tool: String,
    progress_token: Option<ProgressToken>,
    notifier: Option<mpsc::Sender<Message>>,
}

impl ToolContext {
    pub fn new(
        tool: impl Into<String>,
        progress_token: Option<ProgressToken>,
        notifier: Option<mpsc::Sender<Message>>,
    ) -> Self {
        Self {
            tool: tool.into(),
            progress_token,
            notifier,
        }
    }

    /// A context with no client channel.
    pub fn detached(tool: impl Into<String>) -> Self {
        Self::new(tool, None, None)
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    async fn notify(&self, method: &str, params: serde_json::Value) {
        if let Some(ref sender) = self.notifier {
            trace!("{} -> {}", self.tool, method);
            // A closed channel means the client went away; nothing to report to.
            let _ = sender
                .send(Message::Notification(JsonRpcNotification::new(method, params)))
                .await;
        }
    }

    async fn log(&self, level: LogLevel, message: impl Into<String>) {
        let params = LoggingMessageParams {
            level,
            logger: Some(self.tool.clone()),
            data: json!(message.into()),
        };
        if let Ok(params) = serde_json::to_value(params) {
            self.notify("notifications/message", params).await;
        }
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message).await;
    }

    /// Report progress. Does nothing unless the call carried a progress token.
    pub async fn report_progress(&self, progress: u64, total: Option<u64>, message: Option<&str>) {
        let Some(ref token) = self.progress_token else {
            return;
        };
        let params = ProgressParams {
            progress_token: token.clone(),
            progress,
            total,
            message: message.map(String::from),
        };
        if let Ok(params) = serde_json::to_value(params) {
            self.notify("notifications/progress", params).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take_notification(msg: Message) -> JsonRpcNotification {
        match msg {
            Message::Notification(n) => n,
            other => panic!("expected notification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_notification() {
        let (tx, mut rx) = mpsc::channel(4);
        let ctx = ToolContext::new("create_group", None, Some(tx));

        ctx.warning("Failed to add owner o1").await;

        let notif = take_notification(rx.recv().await.unwrap());
        assert_eq!(notif.method, "notifications/message");
        let params = notif.params.unwrap();
        assert_eq!(params["level"], "warning");
        assert_eq!(params["logger"], "create_group");
        assert_eq!(params["data"], "Failed to add owner o1");
    }

    #[tokio::test]
    async fn test_progress_requires_token() {
        let (tx, mut rx) = mpsc::channel(4);
        let ctx = ToolContext::new("get_group_mfa_status", None, Some(tx.clone()));
        ctx.report_progress(1, Some(2), None).await;

        let ctx = ToolContext::new(
            "get_group_mfa_status",
            Some(ProgressToken::String("p-1".into())),
            Some(tx),
        );
        ctx.report_progress(2, Some(2), Some("done")).await;

        let notif = take_notification(rx.recv().await.unwrap());
        assert_eq!(notif.method, "notifications/progress");
        let params = notif.params.unwrap();
        assert_eq!(params["progressToken"], "p-1");
        assert_eq!(params["progress"], 2);
        assert_eq!(params["total"], 2);
        assert_eq!(params["message"], "done");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_detached_context_is_silent() {
        let ctx = ToolContext::detached("ping");
        ctx.error("nobody is listening").await;
        ctx.report_progress(1, None, None).await;
        assert_eq!(ctx.tool(), "ping");
    }
}
