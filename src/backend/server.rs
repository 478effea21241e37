// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use serde_json::json;
use tracing::info;

use super::local::LocalBackend;
use super::store::CreateDiagramParams;
use super::{tools, BackendError, ToolOutput};
use crate::ops::EditDiagramParams;

/// Serves a [`LocalBackend`] as an MCP editing backend over stdio.
#[derive(Clone)]
pub struct BackendServer {
    backend: LocalBackend,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BackendServer {
    pub fn new(backend: LocalBackend) -> Self {
        Self {
            backend,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        info!("serving editing backend on stdio");
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    async fn run(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ErrorData> {
        let output = self
            .backend
            .dispatch(name, arguments)
            .await
            .map_err(internal_error)?;
        Ok(call_tool_result(output))
    }

    /// Start a diagram editing session. Call once before the other tools.
    #[tool(name = "start_session")]
    async fn start_session(&self) -> Result<CallToolResult, ErrorData> {
        self.run(tools::START_SESSION, json!({})).await
    }

    /// Replace the current diagram with a complete mxGraphModel (root cells 0 and 1 included).
    #[tool(name = "create_new_diagram")]
    async fn create_new_diagram(
        &self,
        params: Parameters<CreateDiagramParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let Parameters(params) = params;
        self.run(tools::CREATE_NEW_DIAGRAM, json!({ "xml": params.xml }))
            .await
    }

    /// Return the current diagram as mxGraphModel XML.
    #[tool(name = "get_diagram")]
    async fn get_diagram(&self) -> Result<CallToolResult, ErrorData> {
        self.run(tools::GET_DIAGRAM, json!({})).await
    }

    /// Apply add/update/delete operations by cell id. Deleting a cell also deletes its
    /// children and every edge connected to it. Either all operations apply or none do.
    #[tool(name = "edit_diagram")]
    async fn edit_diagram(
        &self,
        params: Parameters<EditDiagramParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let Parameters(params) = params;
        let arguments = serde_json::to_value(&params)
            .map_err(|err| ErrorData::invalid_params(err.to_string(), None))?;
        self.run(tools::EDIT_DIAGRAM, arguments).await
    }
}

fn call_tool_result(output: ToolOutput) -> CallToolResult {
    let content = output.texts.into_iter().map(Content::text).collect();
    if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

fn internal_error(err: BackendError) -> ErrorData {
    ErrorData::internal_error(err.to_string(), None)
}

#[tool_handler]
impl ServerHandler for BackendServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.instructions = Some(
            "Drawchat diagram editing backend (tools: start_session, create_new_diagram, get_diagram, edit_diagram)"
                .into(),
        );
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info
    }
}
