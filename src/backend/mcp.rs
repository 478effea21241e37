// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, ClientInfo};
use rmcp::service::{Peer, RoleClient};
use rmcp::transport::TokioChildProcess;
use serde_json::{json, Value as JsonValue};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::connection::{CloseSignal, ConnectionManager, Connector};
use super::{tools, BackendError, ToolBackend, ToolOutput};

const CLIENT_NAME: &str = "drawchat";

/// Environment variables passed through to the backend child process; everything else is
/// withheld.
pub const ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "NODE_ENV",
    "HOME",
    "USER",
    "LANG",
    "TERM",
    "SHELL",
    "NODE_PATH",
    "NPM_CONFIG_REGISTRY",
    "npm_config_registry",
];

/// How to launch the editing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            command: "npx".to_owned(),
            args: vec!["-y".to_owned(), "@next-ai-drawio/mcp-server".to_owned()],
        }
    }
}

impl McpConfig {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd.env_clear();
        for key in ENV_ALLOWLIST {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        cmd
    }
}

pub struct McpConnection {
    peer: Peer<RoleClient>,
    watcher: JoinHandle<()>,
}

/// Spawns the backend as a child process speaking MCP over stdio.
#[derive(Debug, Clone, Default)]
pub struct McpConnector {
    config: McpConfig,
}

impl McpConnector {
    pub fn new(config: McpConfig) -> Self {
        Self { config }
    }

    fn client_info() -> ClientInfo {
        let mut info = ClientInfo::default();
        info.client_info.name = CLIENT_NAME.into();
        info.client_info.version = env!("CARGO_PKG_VERSION").into();
        info
    }
}

#[async_trait]
impl Connector for McpConnector {
    type Connection = McpConnection;

    async fn connect(&self, on_close: CloseSignal) -> Result<McpConnection, BackendError> {
        info!(
            command = %self.config.command,
            args = ?self.config.args,
            "spawning editing backend"
        );
        let transport = TokioChildProcess::new(self.config.command())
            .map_err(|err| BackendError::Spawn(err.to_string()))?;
        let service = rmcp::serve_client(Self::client_info(), transport)
            .await
            .map_err(|err| BackendError::Init(err.to_string()))?;

        if let Some(server) = service.peer().peer_info() {
            info!(
                server = %server.server_info.name,
                version = %server.server_info.version,
                "editing backend connected"
            );
        }

        let peer = service.peer().clone();
        let watcher = tokio::spawn(async move {
            match service.waiting().await {
                Ok(reason) => info!(?reason, "editing backend transport closed"),
                Err(err) => warn!(error = %err, "editing backend service task failed"),
            }
            on_close.notify();
        });

        Ok(McpConnection { peer, watcher })
    }

    async fn start_session(&self, connection: &McpConnection) -> Result<(), BackendError> {
        let output = call(&connection.peer, tools::START_SESSION, json!({})).await?;
        if output.is_error {
            return Err(BackendError::ToolFailed {
                tool: tools::START_SESSION.to_owned(),
                message: output.diagnostic(),
            });
        }
        Ok(())
    }

    async fn shutdown(&self, connection: &McpConnection) {
        connection.watcher.abort();
    }
}

#[tracing::instrument(level = "debug", skip(peer, arguments))]
async fn call(
    peer: &Peer<RoleClient>,
    name: &str,
    arguments: JsonValue,
) -> Result<ToolOutput, BackendError> {
    debug!(tool = name, "calling backend tool");
    let mut params = CallToolRequestParams::new(name.to_owned());
    params.meta = None;
    params.arguments = arguments.as_object().cloned();
    params.task = None;
    let result = peer
        .call_tool(params)
        .await
        .map_err(|err| BackendError::Service(err.to_string()))?;
    Ok(tool_output(&result))
}

fn tool_output(result: &CallToolResult) -> ToolOutput {
    ToolOutput {
        is_error: result.is_error.unwrap_or(false),
        texts: result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect(),
    }
}

/// [`ToolBackend`] over a managed MCP child process.
#[derive(Clone)]
pub struct McpBackend {
    manager: ConnectionManager<McpConnector>,
}

impl McpBackend {
    pub fn new(config: McpConfig) -> Self {
        Self {
            manager: ConnectionManager::new(McpConnector::new(config)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Stops the child process; the next call reconnects.
    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
    }
}

#[async_trait]
impl ToolBackend for McpBackend {
    async fn ensure_session(&self) -> Result<(), BackendError> {
        self.manager.ensure_session().await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonValue,
    ) -> Result<ToolOutput, BackendError> {
        let connection = self.manager.acquire().await?;
        call(&connection.peer, name, arguments).await
    }

    async fn list_tools(&self) -> Result<Vec<String>, BackendError> {
        let connection = self.manager.acquire().await?;
        let tools = connection
            .peer
            .list_all_tools()
            .await
            .map_err(|err| BackendError::Service(err.to_string()))?;
        Ok(tools.into_iter().map(|tool| tool.name.to_string()).collect())
    }
}
