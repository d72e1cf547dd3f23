//! MCP resource templates for directory objects.
//!
//! `user://{user_id}` and `group://{group_id}` resolve to the same JSON a
//! client gets from `get_user_by_id` and `get_group_by_id`.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::service::{GroupService, UserService};

const JSON_MIME: &str = "application/json";

/// A concrete resource exposed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A parameterized resource URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Resource contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub text: String,
}

/// Result of resources/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResult {
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Result of resources/templates/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourceTemplatesResult {
    pub resource_templates: Vec<ResourceTemplate>,
}

/// Result of resources/read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    User,
    Group,
}

struct Route {
    kind: TemplateKind,
    pattern: Regex,
    template: ResourceTemplate,
}

/// Resolves resource URIs against the registered templates.
pub struct ResourceRegistry {
    users: Arc<UserService>,
    groups: Arc<GroupService>,
    routes: Vec<Route>,
}

impl ResourceRegistry {
    pub fn new(users: Arc<UserService>, groups: Arc<GroupService>) -> Result<Self> {
        let route = |kind, pattern: &str, uri_template: &str, name: &str, description: &str| {
            Regex::new(pattern)
                .map(|pattern| Route {
                    kind,
                    pattern,
                    template: ResourceTemplate {
                        uri_template: uri_template.to_string(),
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        mime_type: Some(JSON_MIME.to_string()),
                    },
                })
                .map_err(|e| Error::Internal(format!("Invalid resource pattern: {}", e)))
        };

        let routes = vec![
            route(
                TemplateKind::User,
                r"^user://([^/?#]+)$",
                "user://{user_id}",
                "user",
                "Entra ID user profile",
            )?,
            route(
                TemplateKind::Group,
                r"^group://([^/?#]+)$",
                "group://{group_id}",
                "group",
                "Entra ID group details",
            )?,
        ];

        Ok(Self {
            users,
            groups,
            routes,
        })
    }

    /// Directory objects are only reachable through templates.
    pub fn list(&self) -> ListResourcesResult {
        ListResourcesResult {
            resources: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn templates(&self) -> ListResourceTemplatesResult {
        ListResourceTemplatesResult {
            resource_templates: self.routes.iter().map(|r| r.template.clone()).collect(),
        }
    }

    fn resolve(&self, uri: &str) -> Result<(TemplateKind, String)> {
        for route in &self.routes {
            if let Some(caps) = route.pattern.captures(uri) {
                let id = percent_decode_str(&caps[1]).decode_utf8_lossy().into_owned();
                return Ok((route.kind, id));
            }
        }
        Err(Error::not_found(format!("Unknown resource: {}", uri)))
    }

    /// Read a resource by URI.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult> {
        let (kind, id) = self.resolve(uri)?;
        debug!("Reading resource {:?} {}", kind, id);

        let text = match kind {
            TemplateKind::User => serde_json::to_string_pretty(&self.users.get_user_by_id(&id).await?)?,
            TemplateKind::Group => {
                serde_json::to_string_pretty(&self.groups.get_group_by_id(&id).await?)?
            }
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: Some(JSON_MIME.to_string()),
                text,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClientCredential, GraphClient, GraphSettings};
    use crate::metrics::Metrics;
    use secrecy::SecretString;
    use std::time::Duration;

    fn registry() -> ResourceRegistry {
        let settings = GraphSettings {
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            credential: ClientCredential::Secret(SecretString::from("secret".to_string())),
            scopes: vec!["https://graph.microsoft.com/.default".to_string()],
            graph_endpoint: "http://127.0.0.1:9".to_string(),
            authority: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        };
        let client = Arc::new(GraphClient::new(settings, Metrics::new()).unwrap());
        ResourceRegistry::new(
            Arc::new(UserService::new(client.clone())),
            Arc::new(GroupService::new(client)),
        )
        .unwrap()
    }

    #[test]
    fn test_templates() {
        let templates = registry().templates().resource_templates;
        let uris: Vec<_> = templates.iter().map(|t| t.uri_template.as_str()).collect();
        assert_eq!(uris, vec!["user://{user_id}", "group://{group_id}"]);

        let json = serde_json::to_value(&templates[0]).unwrap();
        assert_eq!(json["uriTemplate"], "user://{user_id}");
        assert_eq!(json["mimeType"], "application/json");
    }

    #[test]
    fn test_list_is_empty() {
        assert!(registry().list().resources.is_empty());
    }

    #[test]
    fn test_resolve() {
        let registry = registry();
        let (kind, id) = registry.resolve("user://alice%40contoso.com").unwrap();
        assert_eq!(kind, TemplateKind::User);
        assert_eq!(id, "alice@contoso.com");

        let (kind, id) = registry.resolve("group://g-1").unwrap();
        assert_eq!(kind, TemplateKind::Group);
        assert_eq!(id, "g-1");
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = registry();
        for uri in ["device://d1", "user://", "user://a/b", "file:///etc/passwd"] {
            let err = registry.resolve(uri).unwrap_err();
            assert!(err.is_not_found(), "{} should not resolve", uri);
        }
    }
}
