// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::store::{CreateDiagramParams, DiagramStore};
use super::{tools, BackendError, ToolBackend, ToolOutput};
use crate::ops::EditDiagramParams;

const TOOL_NAMES: [&str; 4] = [
    tools::START_SESSION,
    tools::CREATE_NEW_DIAGRAM,
    tools::GET_DIAGRAM,
    tools::EDIT_DIAGRAM,
];

/// In-process editing backend answering the four diagram tools from a [`DiagramStore`].
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    store: Arc<Mutex<DiagramStore>>,
    session_started: Arc<AtomicBool>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_session_started(&self) -> bool {
        self.session_started.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> DiagramStore {
        self.store.lock().await.clone()
    }

    /// Runs one tool by name; argument and state failures come back as error outputs.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: JsonValue,
    ) -> Result<ToolOutput, BackendError> {
        debug!(tool = name, "local backend call");
        let output = match name {
            tools::START_SESSION => {
                self.session_started.store(true, Ordering::Release);
                ToolOutput::text("Session started.")
            }
            tools::CREATE_NEW_DIAGRAM => match parse_args::<CreateDiagramParams>(arguments) {
                Ok(params) => match self.store.lock().await.replace(&params.xml) {
                    Ok(count) => {
                        info!(cells = count, "diagram replaced");
                        ToolOutput::text(format!("Diagram created with {count} cells."))
                    }
                    Err(err) => ToolOutput::error(format!("Error: {err}")),
                },
                Err(output) => output,
            },
            tools::GET_DIAGRAM => {
                let rendered = self.store.lock().await.render();
                ToolOutput::text(format!("Current diagram XML:\n\n{rendered}"))
            }
            tools::EDIT_DIAGRAM => match parse_args::<EditDiagramParams>(arguments) {
                Ok(params) => match self.store.lock().await.apply(&params.operations) {
                    Ok(delta) => ToolOutput::text(format!(
                        "Applied {} operations: {} added, {} updated, {} removed.",
                        params.operations.len(),
                        delta.added.len(),
                        delta.updated.len(),
                        delta.removed.len()
                    )),
                    Err(err) => ToolOutput::error(format!("Error: {err}")),
                },
                Err(output) => output,
            },
            other => {
                return Err(BackendError::ToolFailed {
                    tool: other.to_owned(),
                    message: "unknown tool".to_owned(),
                })
            }
        };
        Ok(output)
    }
}

fn parse_args<T: DeserializeOwned>(arguments: JsonValue) -> Result<T, ToolOutput> {
    serde_json::from_value(arguments)
        .map_err(|err| ToolOutput::error(format!("Error: invalid arguments: {err}")))
}

#[async_trait]
impl ToolBackend for LocalBackend {
    async fn ensure_session(&self) -> Result<(), BackendError> {
        if !self.is_session_started() {
            self.dispatch(tools::START_SESSION, JsonValue::Null).await?;
        }
        Ok(())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonValue,
    ) -> Result<ToolOutput, BackendError> {
        self.dispatch(name, arguments).await
    }

    async fn list_tools(&self) -> Result<Vec<String>, BackendError> {
        Ok(TOOL_NAMES.iter().map(|name| (*name).to_owned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::LocalBackend;
    use crate::backend::{tools, BackendError, DiagramTools, ToolBackend};
    use crate::ops::EditOperation;
    use crate::xml::extract_canvas_model;

    #[tokio::test]
    async fn create_then_read_back() {
        let backend = LocalBackend::new();
        let diagram = DiagramTools::new(&backend);
        diagram.start_session().await.expect("session");
        assert!(backend.is_session_started());

        let created = diagram
            .create_new_diagram(
                r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="2" value="A" vertex="1" parent="1"/></root></mxGraphModel>"#,
            )
            .await
            .expect("create");
        assert!(!created.is_error);

        let snapshot = diagram.get_diagram().await.expect("get");
        let text = snapshot.joined_text();
        assert!(text.starts_with("Current diagram XML:\n\n<mxGraphModel>"));
        let model = extract_canvas_model(&text).expect("model");
        assert!(model.contains(r#"<mxCell id="2" value="A" vertex="1" parent="1"/>"#));
    }

    #[tokio::test]
    async fn failed_edit_is_an_error_output() {
        let backend = LocalBackend::new();
        let output = DiagramTools::new(&backend)
            .edit_diagram(&[EditOperation::delete("42")])
            .await
            .expect("call");
        assert!(output.is_error);
        assert!(output.diagnostic().contains("operation 0"));
        assert!(output.diagnostic().contains("'42' not found"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_an_error_output() {
        let backend = LocalBackend::new();
        let output = backend
            .call_tool(tools::EDIT_DIAGRAM, json!({ "operations": [{ "operation": "rename" }] }))
            .await
            .expect("call");
        assert!(output.is_error);
        assert!(output.diagnostic().starts_with("Error: invalid arguments"));
    }

    #[tokio::test]
    async fn unknown_tool_fails_the_call() {
        let err = LocalBackend::new()
            .call_tool("export_png", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::ToolFailed { tool, .. } if tool == "export_png"));
    }

    #[tokio::test]
    async fn lists_the_four_diagram_tools() {
        let tools = LocalBackend::new().list_tools().await.expect("tools");
        assert_eq!(
            tools,
            vec![
                "start_session",
                "create_new_diagram",
                "get_diagram",
                "edit_diagram"
            ]
        );

    }
}
