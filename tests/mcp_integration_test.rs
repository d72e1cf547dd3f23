//! MCP Server Integration Tests
//!
//! These tests spawn the server binary and talk JSON-RPC to it over stdio.
//! Graph and the token endpoint point at an unreachable address, so only
//! requests that never touch the network can succeed.

#![allow(deprecated)] // Allow deprecated cargo_bin for now

use assert_cmd::cargo::CommandCargoExt;
use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;

const UNREACHABLE: &str = "http://127.0.0.1:9";

const CREDENTIAL_VARS: &[&str] = &["TENANT_ID", "CLIENT_ID", "CLIENT_SECRET", "CERTIFICATE_PATH"];

/// MCP Test Client that communicates with the server via stdio
struct McpTestClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    request_id: i64,
    _home: TempDir,
}

impl McpTestClient {
    /// Spawn a new MCP server with fake credentials and connect to it
    fn spawn() -> Result<Self, Box<dyn std::error::Error>> {
        let home = TempDir::new()?;
        let mut child = Command::cargo_bin("entraid-mcp")?
            .arg("--transport")
            .arg("stdio")
            .env("TENANT_ID", "00000000-0000-0000-0000-000000000001")
            .env("CLIENT_ID", "00000000-0000-0000-0000-000000000002")
            .env("CLIENT_SECRET", "not-a-real-secret")
            .env_remove("CERTIFICATE_PATH")
            .env("GRAPH_ENDPOINT", UNREACHABLE)
            .env("AUTHORITY_HOST", UNREACHABLE)
            .env("ENTRAID_MCP_REQUEST_TIMEOUT", "2")
            .env("HOME", home.path())
            .current_dir(home.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().expect("Failed to get stdin");
        let stdout = BufReader::new(child.stdout.take().expect("Failed to get stdout"));

        Ok(Self {
            child,
            stdin,
            stdout,
            request_id: 0,
            _home: home,
        })
    }

    /// Send a JSON-RPC request and wait for the response with the same id.
    ///
    /// Log notifications emitted while a tool runs are skipped.
    fn request(&mut self, method: &str, params: Value) -> Result<Value, Box<dyn std::error::Error>> {
        self.request_id += 1;
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.request_id,
            "method": method,
            "params": params
        });

        writeln!(self.stdin, "{}", serde_json::to_string(&request)?)?;
        self.stdin.flush()?;

        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err("server closed stdout".into());
            }
            let message: Value = serde_json::from_str(&line)?;
            if message["id"] == json!(self.request_id) {
                return Ok(message);
            }
        }
    }

    fn initialize(&mut self) -> Result<Value, Box<dyn std::error::Error>> {
        let response = self.request(
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0.0" }
            }),
        )?;
        writeln!(
            self.stdin,
            "{}",
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
        )?;
        self.stdin.flush()?;
        Ok(response)
    }

    fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value, Box<dyn std::error::Error>> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

fn tool_text(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("Expected text content");
    serde_json::from_str(text).expect("Tool text should be JSON")
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_binary_help() {
    AssertCommand::cargo_bin("entraid-mcp")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MCP server"))
        .stdout(predicate::str::contains("--tenant-id"));
}

#[test]
fn test_binary_version() {
    AssertCommand::cargo_bin("entraid-mcp")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("entraid-mcp"));
}

#[test]
fn test_missing_credentials_fails_fast() {
    let home = TempDir::new().unwrap();
    let mut cmd = AssertCommand::cargo_bin("entraid-mcp").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home.path())
        .current_dir(home.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tenant_id"));
}

#[test]
fn test_mcp_initialize() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");

    let response = client.initialize().expect("Failed to initialize");
    let result = &response["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "EntraID MCP Server");
    assert!(result["capabilities"].get("tools").is_some());
    assert!(result["capabilities"].get("resources").is_some());
}

#[test]
fn test_mcp_list_tools() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client.request("tools/list", json!({})).expect("Failed to list tools");
    let tools = response["result"]["tools"]
        .as_array()
        .expect("tools should be array");
    assert_eq!(tools.len(), 41);

    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    for expected in [
        "search_users",
        "get_group_mfa_status",
        "reset_user_password_direct",
        "suggest_permissions_for_task",
        "delete_service_principal",
    ] {
        assert!(names.contains(&expected), "Expected {} tool", expected);
    }
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[test]
fn test_mcp_resource_templates() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client
        .request("resources/templates/list", json!({}))
        .expect("Failed to list templates");
    let templates = response["result"]["resourceTemplates"]
        .as_array()
        .expect("resourceTemplates should be array");
    let uris: Vec<&str> = templates.iter().filter_map(|t| t["uriTemplate"].as_str()).collect();
    assert!(uris.contains(&"user://{user_id}"));
    assert!(uris.contains(&"group://{group_id}"));

    let response = client
        .request("resources/read", json!({ "uri": "device://abc" }))
        .expect("Failed to read resource");
    assert_eq!(response["error"]["code"], -32002);
}

#[test]
fn test_mcp_offline_tool_succeeds() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client
        .call_tool(
            "suggest_permissions_for_task",
            json!({ "task_category": "users", "task_name": "read_user_profile" }),
        )
        .expect("Failed to call tool");

    assert_eq!(response["result"]["isError"], false);
    let body = tool_text(&response);
    assert_eq!(body["task_category"], "users");
    assert!(body["delegated_permissions"].is_array());
}

#[test]
fn test_mcp_unknown_tool_is_protocol_error() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client
        .call_tool("no_such_tool", json!({}))
        .expect("Failed to call tool");
    assert_eq!(response["error"]["code"], -32602);
    assert!(response.get("result").is_none());
}

#[test]
fn test_mcp_unknown_method() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client
        .request("prompts/list", json!({}))
        .expect("Failed to send request");
    assert_eq!(response["error"]["code"], -32601);
}

#[test]
fn test_mcp_graph_failure_is_error_result() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client
        .call_tool("get_user_by_id", json!({ "user_id": "someone" }))
        .expect("Failed to call tool");

    assert_eq!(response["result"]["isError"], true);
    let body = tool_text(&response);
    assert!(body["error"]["kind"].is_string());
    assert!(body["error"]["message"].is_string());
}

#[test]
fn test_mcp_missing_argument_is_error_result() {
    let mut client = McpTestClient::spawn().expect("Failed to spawn MCP server");
    client.initialize().expect("Failed to initialize");

    let response = client
        .call_tool("search_users", json!({}))
        .expect("Failed to call tool");

    assert_eq!(response["result"]["isError"], true);
    assert_eq!(tool_text(&response)["error"]["kind"], "validation");
}
