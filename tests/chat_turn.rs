// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use serde_json::json;

use drawchat::backend::LocalBackend;
use drawchat::chat::{ChatRequest, ChatResponse, Orchestrator};
use drawchat::llm::{
    ChatMessage, ModelChunk, ModelError, ModelRequest, ModelStream, ReasoningModel,
};

const CELLS: &str = concat!(
    r#"<mxCell id="2" value="Start" style="ellipse;" vertex="1" parent="1"><mxGeometry x="40" y="40" width="120" height="60" as="geometry"/></mxCell>"#,
    r#"<mxCell id="3" value="Done" vertex="1" parent="1"><mxGeometry x="40" y="180" width="120" height="60" as="geometry"/></mxCell>"#,
    r#"<mxCell id="4" edge="1" source="2" target="3" parent="1"><mxGeometry relative="1" as="geometry"/></mxCell>"#,
);

/// Answers each turn with the next scripted chunk sequence.
struct TurnQueue {
    turns: Mutex<VecDeque<Vec<ModelChunk>>>,
}

impl TurnQueue {
    fn new(turns: impl IntoIterator<Item = Vec<ModelChunk>>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
        }

    }
}

fn call(name: &str, arguments: serde_json::Value) -> Vec<ModelChunk> {
    let raw = arguments.to_string();
    let mut chunks = vec![ModelChunk::text("On it."), ModelChunk::tool_name(name)];
    chunks.extend(raw.as_bytes().chunks(16).map(|part| {
        ModelChunk::tool_arguments(String::from_utf8_lossy(part).into_owned())
    }));
    chunks
}

#[async_trait]
impl ReasoningModel for TurnQueue {
    fn describe(&self) -> String {
        "turn-queue".to_owned()
    }

    async fn stream(&self, _request: ModelRequest) -> Result<ModelStream, ModelError> {
        let chunks = self
            .turns
            .lock()
            .pop_front()
            .ok_or_else(|| ModelError::Stream("no scripted turn left".to_owned()))?;
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}

#[tokio::test]
async fn draws_then_edits_through_the_local_backend() {
    let model = TurnQueue::new([
        call("display_diagram", json!({ "xml": CELLS })),
        call(
            "edit_diagram",
            json!({ "operations": [{ "operation": "delete", "cell_id": "3" }] }),
        ),
    ]);
    let backend = LocalBackend::new();
    let orchestrator = Orchestrator::new(Arc::new(model), Arc::new(backend.clone()));

    let first = orchestrator
        .run_turn_collect(ChatRequest::new(vec![ChatMessage::user("draw a two step flow")], None))
        .await;
    let ChatResponse::Flowchart { content, xml } = first else {
        panic!("expected a diagram, got {first:?}");
    };
    assert_eq!(content, "On it.");
    assert!(xml.starts_with("<mxfile"));
    assert!(xml.contains("edgeStyle=orthogonalEdgeStyle"));
    assert_eq!(backend.snapshot().await.cells().len(), 3);

    let second = orchestrator
        .run_turn_collect(ChatRequest::new(
            vec![
                ChatMessage::user("draw a two step flow"),
                ChatMessage::assistant("On it."),
                ChatMessage::user("remove the last step"),
            ],
            Some(xml),
        ))
        .await;
    let ChatResponse::Flowchart { xml, .. } = second else {
        panic!("expected an edited diagram, got {second:?}");
    };
    assert!(xml.contains(r#"id="2""#));
    assert!(!xml.contains(r#"id="3""#));
    assert!(!xml.contains(r#"id="4""#));
    assert!(backend.is_session_started());
}

#[tokio::test]
async fn streamed_turn_ends_with_done() {
    let model = TurnQueue::new([vec![ModelChunk::text("Hello"), ModelChunk::text(" there")]]);
    let orchestrator = Orchestrator::new(Arc::new(model), Arc::new(LocalBackend::new()));

    let events: Vec<_> = orchestrator
        .run_turn(ChatRequest::new(vec![ChatMessage::user("hi")], None))
        .collect()
        .await;
    let names: Vec<_> = events.iter().map(|event| event.name()).collect();
    assert_eq!(names, vec!["text", "text", "done"]);
}
