//! Configuration management for the Entra ID MCP server.

use clap::Parser;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Default scope for application permissions on Microsoft Graph.
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Default Microsoft Graph endpoint (public cloud).
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com";

/// Default Microsoft identity platform host.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Command-line arguments for the Entra ID MCP server.
#[derive(Parser, Debug, Clone)]
#[command(name = "entraid-mcp")]
#[command(author = "Entra ID MCP Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server exposing Microsoft Entra ID operations through Microsoft Graph")]
pub struct Args {
    /// Server name reported to MCP clients
    #[arg(long, default_value = "EntraID MCP Server", env = "ENTRAID_MCP_NAME")]
    pub name: String,

    /// Directory (tenant) ID
    #[arg(long, env = "TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Application (client) ID
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// Client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// PEM bundle holding the certificate and its private key
    #[arg(long, env = "CERTIFICATE_PATH")]
    pub certificate_path: Option<PathBuf>,

    /// Password of an encrypted certificate private key
    #[arg(long = "certificate-pwd", env = "CERTIFICATE_PWD", hide_env_values = true)]
    pub certificate_pwd: Option<String>,

    /// OAuth scopes, comma separated
    #[arg(long, env = "GRAPH_SCOPES", value_delimiter = ',', default_value = DEFAULT_SCOPE)]
    pub scopes: Vec<String>,

    /// Transport mode: stdio or http
    #[arg(short, long, default_value = "stdio", env = "ENTRAID_MCP_TRANSPORT")]
    pub transport: Transport,

    /// HTTP bind address (only for http transport)
    #[arg(long, default_value = "127.0.0.1", env = "ENTRAID_MCP_HOST")]
    pub host: String,

    /// HTTP port (only for http transport)
    #[arg(short, long, default_value = "5000", env = "ENTRAID_MCP_PORT")]
    pub port: u16,

    /// Microsoft Graph endpoint
    #[arg(long, default_value = DEFAULT_GRAPH_ENDPOINT, env = "GRAPH_ENDPOINT")]
    pub graph_endpoint: String,

    /// Identity platform host used for token requests
    #[arg(long, default_value = DEFAULT_AUTHORITY, env = "AUTHORITY_HOST")]
    pub authority: String,

    /// Request timeout for Graph calls (seconds)
    #[arg(long, default_value = "30", env = "ENTRAID_MCP_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    /// Enable debug logging
    #[arg(short, long, env = "ENTRAID_MCP_DEBUG")]
    pub debug: bool,

    /// Log output format
    #[arg(long, default_value = "text", env = "ENTRAID_MCP_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Enable metrics collection
    #[arg(long, env = "ENTRAID_MCP_METRICS")]
    pub metrics: bool,
}

/// Transport mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug)]
pub struct Config {
    /// Server name
    pub name: String,
    /// Directory (tenant) ID
    pub tenant_id: Option<String>,
    /// Application (client) ID
    pub client_id: Option<String>,
    /// Client secret
    pub client_secret: Option<SecretString>,
    /// Certificate bundle path
    pub certificate_path: Option<PathBuf>,
    /// Certificate private key password
    pub certificate_pwd: Option<SecretString>,
    /// OAuth scopes
    pub scopes: Vec<String>,
    /// Transport mode
    pub transport: Transport,
    /// HTTP bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Graph endpoint
    pub graph_endpoint: String,
    /// Token authority host
    pub authority: String,
    /// Graph request timeout in seconds
    pub request_timeout_secs: u64,
    /// Debug mode
    pub debug: bool,
    /// Log format
    pub log_format: LogFormat,
    /// Metrics enabled
    pub metrics: bool,
}

impl Config {
    /// Check that enough credentials are present to request a token.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.tenant_id.as_deref().map_or(true, str::is_empty) {
            missing.push("tenant_id");
        }
        if self.client_id.as_deref().map_or(true, str::is_empty) {
            missing.push("client_id");
        }
        if self.client_secret.is_none() && self.certificate_path.is_none() {
            missing.push("client_secret (or certificate_path)");
        }

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required credentials: {}. Set them on the command line, in the environment, or in a .env file",
                missing.join(", ")
            )));
        }

        if self.scopes.is_empty() {
            return Err(Error::Config("At least one scope is required".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("Request timeout must be positive".to_string()));
        }

        Ok(())
    }

    /// Address the HTTP transport binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            name: args.name,
            tenant_id: args.tenant_id,
            client_id: args.client_id,
            client_secret: args
                .client_secret
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            certificate_path: args.certificate_path,
            certificate_pwd: args
                .certificate_pwd
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            scopes: args
                .scopes
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            transport: args.transport,
            host: args.host,
            port: args.port,
            graph_endpoint: args.graph_endpoint.trim_end_matches('/').to_string(),
            authority: args.authority.trim_end_matches('/').to_string(),
            request_timeout_secs: args.request_timeout,
            debug: args.debug,
            log_format: args.log_format,
            metrics: args.metrics,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "EntraID MCP Server".to_string(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            certificate_path: None,
            certificate_pwd: None,
            scopes: vec![DEFAULT_SCOPE.to_string()],
            transport: Transport::Stdio,
            host: "127.0.0.1".to_string(),
            port: 5000,
            graph_endpoint: DEFAULT_GRAPH_ENDPOINT.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            request_timeout_secs: 30,
            debug: false,
            log_format: LogFormat::Text,
            metrics: false,
        }
    }
}

/// Locations searched for a `.env` file, in priority order.
pub fn env_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config").join(".env"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".entraid").join(".env"));
    }
    candidates.push(PathBuf::from("/etc/entraid/.env"));
    candidates
}

/// Load the first `.env` file found among `candidates`.
///
/// Variables already present in the process environment win over the file.
pub fn load_env_file<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    for candidate in candidates {
        let path = candidate.as_ref();
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path(path) {
            Ok(()) => return Some(path.to_path_buf()),
            Err(e) => debug!("Skipping unreadable env file {}: {}", path.display(), e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn base_args() -> Args {
        Args::parse_from(["entraid-mcp"])
    }

    #[test]
    fn test_transport_default() {
        assert_eq!(Transport::default(), Transport::Stdio);
    }

    #[test]
    fn test_transport_serialization() {
        let transports = [
            (Transport::Stdio, "\"stdio\""),
            (Transport::Http, "\"http\""),
        ];

        for (transport, expected) in &transports {
            let json = serde_json::to_string(transport).unwrap();
            assert_eq!(json, *expected);
        }
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.scopes, vec![DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.debug);
        assert!(!config.metrics);
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn test_args_to_config() {
        let args = Args::parse_from([
            "entraid-mcp",
            "--tenant-id",
            "tenant-1",
            "--client-id",
            "client-1",
            "--client-secret",
            "s3cret",
            "--scopes",
            "https://graph.microsoft.com/.default, ",
            "--transport",
            "http",
            "--port",
            "8080",
            "--graph-endpoint",
            "http://localhost:9000/",
        ]);

        let config: Config = args.into();

        assert_eq!(config.tenant_id.as_deref(), Some("tenant-1"));
        assert_eq!(config.client_id.as_deref(), Some("client-1"));
        assert_eq!(
            config.client_secret.as_ref().map(|s| s.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
        assert_eq!(config.scopes, vec![DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.port, 8080);
        assert_eq!(config.graph_endpoint, "http://localhost:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let mut args = base_args();
        args.tenant_id = None;
        args.client_id = Some("client".to_string());
        args.client_secret = Some(String::new());
        args.certificate_path = None;
        let config: Config = args.into();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tenant_id"));
        assert!(err.contains("client_secret"));
        assert!(!err.contains("client_id,"));
    }

    #[test]
    fn test_validate_accepts_certificate() {
        let config = Config {
            tenant_id: Some("t".to_string()),
            client_id: Some("c".to_string()),
            certificate_path: Some(PathBuf::from("/tmp/cert.pem")),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_certificate_password_flag() {
        let args = Args::parse_from([
            "entraid-mcp",
            "--tenant-id",
            "t",
            "--client-id",
            "c",
            "--certificate-path",
            "/tmp/cert.pem",
            "--certificate-pwd",
            "pfx-pass",
        ]);
        let config: Config = args.into();

        assert_eq!(
            config.certificate_pwd.as_ref().map(|s| s.expose_secret().to_string()),
            Some("pfx-pass".to_string())
        );
        assert!(!format!("{:?}", config).contains("pfx-pass"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = Config {
            client_secret: Some(SecretString::from("hunter2".to_string())),
            ..Config::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_env_file_candidates_order() {
        let candidates = env_file_candidates();
        assert!(candidates.first().unwrap().ends_with("config/.env"));
        assert_eq!(
            candidates.last().unwrap(),
            &PathBuf::from("/etc/entraid/.env")
        );
    }

    #[test]
    fn test_load_env_file_picks_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.env");
        let present = dir.path().join("present.env");
        let mut file = std::fs::File::create(&present).unwrap();
        writeln!(file, "ENTRAID_MCP_TEST_ONLY_VAR=loaded").unwrap();

        let loaded = load_env_file(&[missing, present.clone()]);
        assert_eq!(loaded, Some(present));
        assert_eq!(
            std::env::var("ENTRAID_MCP_TEST_ONLY_VAR").as_deref(),
            Ok("loaded")
        );
    }

    #[test]
    fn test_load_env_file_none_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(&[dir.path().join("nope.env")]).is_none());
    }
}
