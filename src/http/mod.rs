// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! HTTP surface: streaming and one-shot chat turns, health and tool listing.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{stream, StreamExt};
use serde_json::json;
use tracing::warn;

use crate::chat::{ChatRequest, ChatResponse, ErrorKind, Orchestrator, RequestError, TurnEvent};

/// Large enough for a 1 MiB current document plus a full message history.
const BODY_LIMIT: usize = 4 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    orchestrator: Orchestrator,
}

pub fn router(orchestrator: Orchestrator) -> Router {
    Router::new()
        .route("/api/chat", post(chat_stream))
        .route("/api/chat/complete", post(chat_complete))
        .route("/api/tools", get(list_tools))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(AppState { orchestrator })
}

fn sse_event(event: &TurnEvent) -> Event {
    Event::default()
        .event(event.name())
        .data(event.payload().to_string())
}

fn rejection(err: &RequestError) -> (ErrorKind, String) {
    warn!(error = %err, "rejecting chat request");
    (ErrorKind::RequestMalformed, err.to_string())
}

async fn chat_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match ChatRequest::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let (kind, content) = rejection(&err);
            let event = sse_event(&TurnEvent::error(kind, content));
            let events = stream::iter([Ok::<_, Infallible>(event)]);
            return (StatusCode::BAD_REQUEST, Sse::new(events)).into_response();
        }
    };

    let events = state
        .orchestrator
        .run_turn(request)
        .map(|event| Ok::<_, Infallible>(sse_event(&event)));
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn chat_complete(State(state): State<AppState>, body: Bytes) -> Response {
    let response = match ChatRequest::from_slice(&body) {
        Ok(request) => state.orchestrator.run_turn_collect(request).await,
        Err(err) => {
            let (kind, content) = rejection(&err);
            ChatResponse::Error { kind, content }
        }
    };
    let status =
        StatusCode::from_u16(response.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}

async fn list_tools(State(state): State<AppState>) -> Response {
    match state.orchestrator.backend().list_tools().await {
        Ok(tools) => Json(json!({ "tools": tools })).into_response(),
        Err(err) => {
            warn!(error = %err, "listing backend tools failed");
            let body = Json(json!({ "error": err.to_string() }));
            (StatusCode::BAD_GATEWAY, body).into_response()

        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}
