// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The diagram-editing backend.
//!
//! The backend is reached as a remote capability with two operations: invoke a named tool and
//! list the tools. [`McpBackend`] talks to an external MCP server over a child process;
//! [`LocalBackend`] answers the same tools from an in-process [`DiagramStore`], which
//! [`BackendServer`] can also expose over MCP stdio.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::ops::EditOperation;

pub mod connection;
mod local;
mod mcp;
mod server;
mod store;

pub use connection::{CloseSignal, ConnectionManager, Connector};
pub use local::LocalBackend;
pub use mcp::{McpBackend, McpConfig, McpConnector};
pub use server::BackendServer;
pub use store::{CreateDiagramParams, Delta, DiagramStore, StoreError};

/// Tool names exposed by the editing backend.
pub mod tools {
    pub const START_SESSION: &str = "start_session";
    pub const CREATE_NEW_DIAGRAM: &str = "create_new_diagram";
    pub const GET_DIAGRAM: &str = "get_diagram";
    pub const EDIT_DIAGRAM: &str = "edit_diagram";
}

const UNKNOWN_ERROR: &str = "unknown error";

/// Result of one tool call: the text parts of the response and the `isError` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub is_error: bool,
    pub texts: Vec<String>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            texts: vec![text.into()],
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            texts: vec![text.into()],
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.texts.first().map(String::as_str)
    }

    pub fn joined_text(&self) -> String {
        self.texts.join("\n")
    }

    /// Human-readable diagnostic for an error result.
    pub fn diagnostic(&self) -> String {
        self.first_text()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_ERROR)
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("failed to spawn editing backend: {0}")]
    Spawn(String),
    #[error("failed to initialize editing backend: {0}")]
    Init(String),
    #[error("editing backend call failed: {0}")]
    Service(String),
    #[error("editing backend tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },
    #[error("editing backend is not connected")]
    Disconnected,
}

#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Makes sure the backend session is started; idempotent.
    async fn ensure_session(&self) -> Result<(), BackendError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonValue,
    ) -> Result<ToolOutput, BackendError>;

    async fn list_tools(&self) -> Result<Vec<String>, BackendError>;
}

/// Typed wrappers for the four diagram tools.
pub struct DiagramTools<'a> {
    backend: &'a dyn ToolBackend,
}

impl<'a> DiagramTools<'a> {
    pub fn new(backend: &'a dyn ToolBackend) -> Self {
        Self { backend }
    }

    pub async fn start_session(&self) -> Result<(), BackendError> {
        self.backend.ensure_session().await
    }

    pub async fn create_new_diagram(&self, model_xml: &str) -> Result<ToolOutput, BackendError> {
        self.backend
            .call_tool(tools::CREATE_NEW_DIAGRAM, json!({ "xml": model_xml }))
            .await
    }

    /// Free text with the current `<mxGraphModel>` embedded somewhere inside.
    pub async fn get_diagram(&self) -> Result<ToolOutput, BackendError> {
        let output = self.backend.call_tool(tools::GET_DIAGRAM, json!({})).await?;
        debug!(
            is_error = output.is_error,
            bytes = output.joined_text().len(),
            "get_diagram"
        );
        Ok(output)
    }

    pub async fn edit_diagram(
        &self,
        operations: &[EditOperation],
    ) -> Result<ToolOutput, BackendError> {
        self.backend
            .call_tool(tools::EDIT_DIAGRAM, json!({ "operations": operations }))
            .await

    }
}
