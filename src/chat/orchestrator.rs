// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::accumulator::{ArgumentParseError, ModelTurn, Progress, ToolCallAccumulator};
use super::request::ChatRequest;
use super::{
    ChatResponse, ErrorKind, TurnEvent, CREATED_CAPTION, EDITED_CAPTION, FALLBACK_MESSAGE,
    GENERIC_FAILURE_MESSAGE, MALFORMED_ARGUMENTS_MESSAGE, STATUS_GENERATING,
};
use crate::backend::ToolBackend;
use crate::llm::tools::{DISPLAY_DIAGRAM, EDIT_DIAGRAM};
use crate::llm::{
    build_system_message, tool_definitions, ModelError, ModelRequest, ReasoningModel, ToolChoice,
};
use crate::ops::{
    apply_edits, display_diagram, DiagramResult, DisplayDiagramParams, EditDiagramParams,
    EditError,
};
use crate::xml::{clean_llm_content, sanitize_edges};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOptions {
    /// Force orthogonal routing on connectors of returned diagrams.
    pub sanitize_edges: bool,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            sanitize_edges: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum TurnError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Arguments(#[from] ArgumentParseError),
    #[error("arguments of tool '{name}' do not match its schema: {source}")]
    Schema {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("model called unknown tool '{0}'")]
    UnknownTool(String),
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl TurnError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(_) => ErrorKind::Internal,
            Self::Arguments(_) | Self::Schema { .. } | Self::UnknownTool(_) => {
                ErrorKind::ArgumentParseError
            }
            Self::Edit(err) => ErrorKind::from(err),
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Model(_) => GENERIC_FAILURE_MESSAGE.to_owned(),
            Self::Arguments(_) | Self::Schema { .. } | Self::UnknownTool(_) => {
                MALFORMED_ARGUMENTS_MESSAGE.to_owned()
            }
            Self::Edit(err) => err.to_string(),
        }
    }
}

struct Emitter {
    tx: mpsc::UnboundedSender<TurnEvent>,
}

impl Emitter {
    /// `false` once the receiving side is gone.
    fn emit(&self, event: TurnEvent) -> bool {
        self.tx.unbounded_send(event).is_ok()
    }
}

/// Runs chat turns against a reasoning model and an editing backend.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn ReasoningModel>,
    backend: Arc<dyn ToolBackend>,
    options: TurnOptions,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ReasoningModel>, backend: Arc<dyn ToolBackend>) -> Self {
        Self {
            model,
            backend,
            options: TurnOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TurnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend(&self) -> &Arc<dyn ToolBackend> {
        &self.backend
    }

    /// Starts a turn on the runtime and streams its events.
    ///
    /// Exactly one of a diagram, a text reply or an error is produced, followed by
    /// [`TurnEvent::Done`]. Dropping the stream abandons the turn at the next event.
    pub fn run_turn(&self, request: ChatRequest) -> BoxStream<'static, TurnEvent> {
        let (tx, rx) = mpsc::unbounded();
        let this = self.clone();
        let span = info_span!(
            "turn",
            messages = request.messages.len(),
            editing = request.current_xml.is_some()
        );
        tokio::spawn(
            async move {
                let emitter = Emitter { tx };
                match AssertUnwindSafe(this.drive(request, &emitter))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        let kind = err.kind();
                        warn!(?kind, error = %err, "turn failed");
                        emitter.emit(TurnEvent::error(kind, err.user_message()));
                    }
                    Err(_) => {
                        error!("turn panicked");
                        emitter.emit(TurnEvent::error(
                            ErrorKind::Internal,
                            GENERIC_FAILURE_MESSAGE,
                        ));
                    }
                }
                emitter.emit(TurnEvent::Done);
            }
            .instrument(span),
        );
        rx.boxed()
    }

    /// Runs a turn to completion and folds it into one response.
    pub async fn run_turn_collect(&self, request: ChatRequest) -> ChatResponse {
        let events: Vec<TurnEvent> = self.run_turn(request).collect().await;
        ChatResponse::from_events(events)
    }

    async fn drive(&self, request: ChatRequest, emitter: &Emitter) -> Result<(), TurnError> {
        let ChatRequest {
            messages,
            current_xml,
        } = request;
        let system = build_system_message(current_xml.as_deref());
        let model_request = ModelRequest::new(system, messages)
            .with_tools(tool_definitions(), ToolChoice::Required);

        info!(model = %self.model.describe(), "invoking model");
        let mut stream = self.model.stream(model_request).await?;
        let mut accumulator = ToolCallAccumulator::new();
        while let Some(chunk) = stream.next().await {
            for progress in accumulator.push(chunk?) {
                let event = match progress {
                    Progress::Text(text) => TurnEvent::text(text),
                    Progress::InvocationStarted(name) => {
                        debug!(tool = %name, "model started a tool call");
                        TurnEvent::status(STATUS_GENERATING)
                    }
                };
                if !emitter.emit(event) {
                    info!("client went away; abandoning turn");
                    return Ok(());
                }
            }
        }

        match accumulator.finish()? {
            ModelTurn::Invocation {
                name,
                arguments,
                text,
            } => {

                let (result, default_caption) = match name.as_str() {
                    DISPLAY_DIAGRAM => {
                        let params: DisplayDiagramParams = typed_arguments(&name, arguments)?;
                        let result = display_diagram(self.backend.as_ref(), &params.xml).await?;
                        (result, CREATED_CAPTION)
                    }
                    EDIT_DIAGRAM => {
                        let params: EditDiagramParams = typed_arguments(&name, arguments)?;
                        let result = apply_edits(
                            self.backend.as_ref(),
                            &params.operations,
                            current_xml.as_deref(),
                        )
                        .await?;
                        (result, EDITED_CAPTION)
                    }
                    _ => return Err(TurnError::UnknownTool(name)),
                };
                emitter.emit(self.flowchart(result, &text, default_caption));
            }
            ModelTurn::Text(text) => debug!(chars = text.len(), "text-only turn"),
            ModelTurn::Silent => {
                emitter.emit(TurnEvent::text(FALLBACK_MESSAGE));
            }
        }
        Ok(())
    }

    fn flowchart(&self, result: DiagramResult, text: &str, default_caption: &str) -> TurnEvent {
        if result.recovered {
            warn!("returning the previous diagram unchanged");
        }
        let caption = clean_llm_content(Some(text));
        let content = if caption.trim().is_empty() {
            default_caption.to_owned()
        } else {
            caption
        };
        let xml = if self.options.sanitize_edges {
            sanitize_edges(&result.xml).into_owned()
        } else {
            result.xml
        };
        TurnEvent::Flowchart { content, xml }
    }
}

fn typed_arguments<T: DeserializeOwned>(name: &str, arguments: JsonValue) -> Result<T, TurnError> {
    serde_json::from_value(arguments).map_err(|source| TurnError::Schema {
        name: name.to_owned(),
        source,
    })
}

