// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One chat turn, from the user's message to a diagram or a reply.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::ops::EditError;

pub mod accumulator;
mod orchestrator;
pub mod request;

pub use accumulator::{ArgumentParseError, ModelTurn, Progress, ToolCallAccumulator};
pub use orchestrator::{Orchestrator, TurnOptions};
pub use request::{ChatRequest, RequestError};

pub const STATUS_GENERATING: &str = "Generating diagram...";
pub const FALLBACK_MESSAGE: &str =
    "I can draw flowcharts and other diagrams for you. Describe the process you have in mind.";
pub const CREATED_CAPTION: &str = "Here is your diagram:";
pub const EDITED_CAPTION: &str = "The diagram has been updated:";
pub const MALFORMED_ARGUMENTS_MESSAGE: &str =
    "The assistant returned malformed tool arguments. Please try again.";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "The service could not process the request. Please try again later.";

/// Failure classes surfaced to the client, one per terminal error of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RequestMalformed,
    XmlValidationFailed,
    ArgumentParseError,
    NoDiagramToEdit,
    BackendCallFailed,
    Internal,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            Self::RequestMalformed => 400,
            Self::XmlValidationFailed => 422,
            Self::ArgumentParseError => 502,
            Self::NoDiagramToEdit => 409,
            Self::BackendCallFailed => 502,
            Self::Internal => 500,
        }
    }
}

impl From<&EditError> for ErrorKind {
    fn from(err: &EditError) -> Self {
        match err {
            EditError::Validation(_) => Self::XmlValidationFailed,
            EditError::NoDiagramToEdit => Self::NoDiagramToEdit,
            EditError::CreateFailed(_) | EditError::EditFailed(_) | EditError::Backend(_) => {
                Self::BackendCallFailed
            }
        }
    }
}

/// Incremental output of a turn; [`TurnEvent::Done`] is always the last event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Text { content: String },
    Status { content: String },
    Flowchart { content: String, xml: String },
    Error { kind: ErrorKind, content: String },
    Done,
}

impl TurnEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn status(content: impl Into<String>) -> Self {
        Self::Status {
            content: content.into(),
        }
    }

    pub fn error(kind: ErrorKind, content: impl Into<String>) -> Self {
        Self::Error {
            kind,
            content: content.into(),
        }

    }

    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Status { .. } => "status",
            Self::Flowchart { .. } => "flowchart",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }

    pub fn payload(&self) -> JsonValue {
        match self {
            Self::Text { content } | Self::Status { content } => json!({ "content": content }),
            Self::Flowchart { content, xml } => json!({ "content": content, "xml": xml }),
            Self::Error { kind, content } => json!({ "content": content, "kind": kind }),
            Self::Done => json!({}),
        }
    }
}

/// The whole turn as a single response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatResponse {
    Text { content: String },
    Flowchart { content: String, xml: String },
    Error { kind: ErrorKind, content: String },
}

impl ChatResponse {
    /// Folds a finished event sequence: an error wins over a diagram, a diagram over text.
    pub fn from_events(events: impl IntoIterator<Item = TurnEvent>) -> Self {
        let mut text = String::new();
        let mut flowchart = None;
        for event in events {
            match event {
                TurnEvent::Text { content } => text.push_str(&content),
                TurnEvent::Flowchart { content, xml } => flowchart = Some((content, xml)),
                TurnEvent::Error { kind, content } => return Self::Error { kind, content },
                TurnEvent::Status { .. } | TurnEvent::Done => {}
            }
        }
        match flowchart {
            Some((content, xml)) => Self::Flowchart { content, xml },
            None => Self::Text { content: text },
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Error { kind, .. } => kind.http_status(),
            _ => 200,
        }
    }
}

#[cfg(test)]
mod tests;
