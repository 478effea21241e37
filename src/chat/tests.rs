// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use rstest::rstest;
use serde_json::json;

use super::{
    ChatRequest, ChatResponse, ErrorKind, Orchestrator, TurnEvent, TurnOptions, CREATED_CAPTION,
    EDITED_CAPTION, FALLBACK_MESSAGE, GENERIC_FAILURE_MESSAGE, MALFORMED_ARGUMENTS_MESSAGE,
    STATUS_GENERATING,
};
use crate::backend::LocalBackend;
use crate::llm::testing::ScriptedModel;
use crate::llm::{
    ChatMessage, ModelChunk, ModelError, ModelRequest, ModelStream, ReasoningModel,
};

const START: &str = r#"<mxCell id="2" value="Start" vertex="1" parent="1"><mxGeometry x="40" y="40" width="120" height="60" as="geometry"/></mxCell>"#;

struct PanickingModel;

#[async_trait]
impl ReasoningModel for PanickingModel {
    fn describe(&self) -> String {
        "panicking".to_owned()
    }

    async fn stream(&self, _request: ModelRequest) -> Result<ModelStream, ModelError> {
        panic!("model exploded");
    }
}

fn request(current_xml: Option<&str>) -> ChatRequest {
    ChatRequest::new(
        vec![ChatMessage::user("draw a start node")],
        current_xml.map(str::to_owned),
    )
}

async fn run(
    model: Arc<dyn ReasoningModel>,
    backend: LocalBackend,
    current_xml: Option<&str>,
) -> Vec<TurnEvent> {
    Orchestrator::new(model, Arc::new(backend))
        .run_turn(request(current_xml))
        .collect()
        .await
}

#[tokio::test]
async fn display_turn_emits_status_then_flowchart_then_done() {
    let model = ScriptedModel::tool_call("display_diagram", json!({ "xml": START }));
    let events = run(Arc::new(model), LocalBackend::new(), None).await;

    assert_eq!(events.len(), 3, "{events:?}");
    assert_eq!(events[0], TurnEvent::status(STATUS_GENERATING));
    let TurnEvent::Flowchart { content, xml } = &events[1] else {
        panic!("expected flowchart, got {:?}", events[1]);
    };
    assert_eq!(content, CREATED_CAPTION);
    assert_eq!(xml.matches(r#"id="2""#).count(), 1);
    assert_eq!(xml.matches(r#"<mxCell id="0"/>"#).count(), 1);
    assert_eq!(xml.matches(r#"<mxCell id="1" parent="0"/>"#).count(), 1);
    assert!(xml.contains("<mxfile "));
    assert_eq!(events[2], TurnEvent::Done);
}

#[tokio::test]
async fn free_text_alongside_a_call_becomes_the_caption() {
    let model = ScriptedModel::new(vec![
        ModelChunk::text("A single start node."),
        ModelChunk::tool_name("display_diagram"),
        ModelChunk::tool_arguments(json!({ "xml": START }).to_string()),
    ]);
    let response = Orchestrator::new(Arc::new(model), Arc::new(LocalBackend::new()))
        .run_turn_collect(request(None))
        .await;

    let ChatResponse::Flowchart { content, .. } = response else {
        panic!("expected flowchart, got {response:?}");
    };
    assert_eq!(content, "A single start node.");
}

#[tokio::test]
async fn edit_turn_uses_current_document_and_backend_state() {
    let backend = LocalBackend::new();
    let end = r#"<mxCell id="3" value="End" vertex="1" parent="1"><mxGeometry x="240" y="40" width="120" height="60" as="geometry"/></mxCell>"#;
    let display = ScriptedModel::tool_call(
        "display_diagram",
        json!({ "xml": format!("{START}{end}") }),
    );
    let first = Orchestrator::new(Arc::new(display), Arc::new(backend.clone()))
        .run_turn_collect(request(None))
        .await;
    let ChatResponse::Flowchart { xml: document, .. } = first else {
        panic!("expected flowchart, got {first:?}");
    };

    let edit = Arc::new(ScriptedModel::tool_call(
        "edit_diagram",
        json!({ "operations": [{ "operation": "delete", "cell_id": "3" }] }),
    ));
    let events = run(edit.clone(), backend, Some(&document)).await;

    assert!(edit.system_prompt().contains("## Current Diagram XML"));
    let TurnEvent::Flowchart { content, xml } = &events[1] else {
        panic!("expected flowchart, got {:?}", events[1]);
    };
    assert_eq!(content, EDITED_CAPTION);
    assert!(xml.contains(START));
    assert!(!xml.contains(r#"id="3""#));
}

#[tokio::test]
async fn text_turn_streams_text_and_folds_into_text_response() {
    let model = Arc::new(ScriptedModel::new(vec![
        ModelChunk::text("Which "),
        ModelChunk::text("process?"),
    ]));
    let events = run(model.clone(), LocalBackend::new(), None).await;
    assert_eq!(
        events,
        vec![
            TurnEvent::text("Which "),
            TurnEvent::text("process?"),
            TurnEvent::Done
        ]
    );
    assert!(!model.system_prompt().contains("## Current Diagram XML"));
    assert_eq!(
        ChatResponse::from_events(events),
        ChatResponse::Text {
            content: "Which process?".to_owned(),
        }

    );
}

#[tokio::test]
async fn silent_turn_gets_fallback_message() {
    let events = run(Arc::new(ScriptedModel::default()), LocalBackend::new(), None).await;
    assert_eq!(
        events,
        vec![TurnEvent::text(FALLBACK_MESSAGE), TurnEvent::Done]
    );
}

#[rstest]
#[case::broken_json(ScriptedModel::new(vec![
    ModelChunk::tool_name("display_diagram"),
    ModelChunk::tool_arguments(r#"{"xml":"<mxCell"#),
]))]
#[case::wrong_shape(ScriptedModel::tool_call("display_diagram", json!({ "cells": START })))]
#[case::unknown_tool(ScriptedModel::tool_call("export_png", json!({})))]
#[case::empty_cell_id(ScriptedModel::tool_call(
    "edit_diagram",
    json!({ "operations": [{ "operation": "delete", "cell_id": "" }] }),
))]
#[tokio::test]
async fn unusable_invocations_are_argument_errors(#[case] model: ScriptedModel) {
    let events = run(Arc::new(model), LocalBackend::new(), None).await;
    assert_eq!(
        events,
        vec![
            TurnEvent::status(STATUS_GENERATING),
            TurnEvent::error(ErrorKind::ArgumentParseError, MALFORMED_ARGUMENTS_MESSAGE),
            TurnEvent::Done,
        ]
    );
}

#[tokio::test]
async fn invalid_cells_map_to_validation_failure() {
    let model = ScriptedModel::tool_call(
        "display_diagram",
        json!({ "xml": r#"<mxCell id="2">"# }),
    );
    let response = Orchestrator::new(Arc::new(model), Arc::new(LocalBackend::new()))
        .run_turn_collect(request(None))
        .await;
    let ChatResponse::Error { kind, content } = &response else {
        panic!("expected error, got {response:?}");
    };
    assert_eq!(*kind, ErrorKind::XmlValidationFailed);
    assert!(content.contains("1 opening and 0 closing"));
    assert_eq!(response.http_status(), 422);
}

#[tokio::test]
async fn edit_without_diagram_is_client_correctable() {
    let model = ScriptedModel::tool_call(
        "edit_diagram",
        json!({ "operations": [{ "operation": "delete", "cell_id": "2" }] }),
    );
    let response = Orchestrator::new(Arc::new(model), Arc::new(LocalBackend::new()))
        .run_turn_collect(request(None))
        .await;
    assert!(matches!(
        response,
        ChatResponse::Error {
            kind: ErrorKind::NoDiagramToEdit,
            ..
        }
    ));
    assert_eq!(response.http_status(), 409);
}

#[tokio::test]
async fn model_failure_is_reported_generically() {
    let model = ScriptedModel {
        refuse: Some(ModelError::Status {
            status: 401,
            body: "bad key".to_owned(),
        }),
        ..ScriptedModel::default()
    };
    let events = run(Arc::new(model), LocalBackend::new(), None).await;
    assert_eq!(
        events,
        vec![
            TurnEvent::error(ErrorKind::Internal, GENERIC_FAILURE_MESSAGE),
            TurnEvent::Done
        ]
    );
}

#[tokio::test]
async fn mid_stream_failure_keeps_streamed_text_and_ends_with_done() {
    let model = ScriptedModel {
        chunks: vec![
            Ok(ModelChunk::text("Drawing")),
            Err(ModelError::Stream("reset".to_owned())),
        ],
        ..ScriptedModel::default()
    };
    let events = run(Arc::new(model), LocalBackend::new(), None).await;
    assert_eq!(events.first(), Some(&TurnEvent::text("Drawing")));
    assert!(matches!(
        events[1],
        TurnEvent::Error {
            kind: ErrorKind::Internal,
            ..
        }
    ));
    assert_eq!(events.last(), Some(&TurnEvent::Done));
}

#[tokio::test]
async fn panics_are_contained_at_the_turn_boundary() {
    let events = run(Arc::new(PanickingModel), LocalBackend::new(), None).await;
    assert_eq!(
        events,
        vec![
            TurnEvent::error(ErrorKind::Internal, GENERIC_FAILURE_MESSAGE),
            TurnEvent::Done
        ]
    );
}

#[rstest]
#[case::sanitized(true, true)]
#[case::verbatim(false, false)]
#[tokio::test]
async fn edge_sanitization_follows_options(#[case] sanitize: bool, #[case] expect_routing: bool) {
    let cells = format!(
        r#"{START}<mxCell id="3" vertex="1" parent="1"/><mxCell id="4" style="endArrow=classic;" edge="1" parent="1" source="2" target="3"><mxGeometry relative="1" as="geometry"/></mxCell>"#
    );
    let model = ScriptedModel::tool_call("display_diagram", json!({ "xml": cells }));
    let response = Orchestrator::new(Arc::new(model), Arc::new(LocalBackend::new()))
        .with_options(TurnOptions {
            sanitize_edges: sanitize,
        })
        .run_turn_collect(request(None))
        .await;

    let ChatResponse::Flowchart { xml, .. } = response else {
        panic!("expected flowchart, got {response:?}");
    };
    assert_eq!(xml.contains("edgeStyle=orthogonalEdgeStyle"), expect_routing);
    assert!(xml.contains("endArrow=classic"));
}

#[test]
fn events_serialize_to_wire_payloads() {
    assert_eq!(TurnEvent::Done.name(), "done");
    assert_eq!(TurnEvent::Done.payload(), json!({}));
    assert_eq!(
        TurnEvent::error(ErrorKind::NoDiagramToEdit, "nothing").payload(),
        json!({ "content": "nothing", "kind": "no_diagram_to_edit" })
    );
    let response = ChatResponse::Flowchart {
        content: "c".to_owned(),
        xml: "<mxfile/>".to_owned(),
    };

    assert_eq!(
        serde_json::to_value(&response).expect("json"),
        json!({ "type": "flowchart", "content": "c", "xml": "<mxfile/>" })
    );
}
