// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::Value as JsonValue;

use crate::llm::ModelChunk;

/// Something the caller can show while the model is still streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Text(String),
    /// The first tool name of the turn arrived.
    InvocationStarted(String),
}

/// How a model turn resolved once its stream ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// Free text only; it was already surfaced chunk by chunk.
    Text(String),
    Invocation {
        name: String,
        arguments: JsonValue,
        /// Free text produced alongside the call, if any.
        text: String,
    },
    /// Neither text nor a named invocation.
    Silent,
}

#[derive(Debug, thiserror::Error)]
#[error("arguments of tool '{name}' are not valid JSON: {source}")]
pub struct ArgumentParseError {
    pub name: String,
    #[source]
    pub source: serde_json::Error,
}

/// Reassembles one model turn from streamed chunks.
///
/// Argument fragments are buffered verbatim and parsed exactly once, in [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    name: Option<String>,
    arguments: String,
    text: String,
    has_invocation: bool,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: ModelChunk) -> Vec<Progress> {
        let mut progress = Vec::new();
        if let Some(text) = chunk.text.filter(|text| !text.is_empty()) {
            self.text.push_str(&text);
            progress.push(Progress::Text(text));
        }
        if chunk.tool_name.is_some() || chunk.tool_arguments.is_some() {
            self.has_invocation = true;
        }
        if let Some(name) = chunk.tool_name.filter(|name| !name.is_empty()) {
            if self.name.is_none() {
                progress.push(Progress::InvocationStarted(name.clone()));
                self.name = Some(name);
            }
        }
        if let Some(fragment) = chunk.tool_arguments {
            self.arguments.push_str(&fragment);
        }
        progress
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> Result<ModelTurn, ArgumentParseError> {
        match self.name {
            Some(name) if self.has_invocation => {
                let raw = if self.arguments.trim().is_empty() {
                    "{}"
                } else {
                    &self.arguments
                };
                match serde_json::from_str(raw) {
                    Ok(arguments) => Ok(ModelTurn::Invocation {
                        name,
                        arguments,
                        text: self.text,
                    }),

                    Err(source) => Err(ArgumentParseError { name, source }),
                }
            }
            _ if !self.text.is_empty() => Ok(ModelTurn::Text(self.text)),
            _ => Ok(ModelTurn::Silent),
        }
    }
}
