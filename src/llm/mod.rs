// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The reasoning model behind a chat turn.
//!
//! A model is consumed through [`ReasoningModel::stream`], which yields [`ModelChunk`]s as the
//! provider produces them. Chunks carry free text and tool-call fragments verbatim; nothing
//! here tries to interpret the fragments.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub mod openai;
pub mod prompt;
pub mod sse;
#[cfg(test)]
pub(crate) mod testing;
pub mod tools;

pub use openai::{OpenAiModel, Provider};
pub use prompt::build_system_message;
pub use tools::{tool_definitions, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

/// One streamed completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
}

impl ModelRequest {
    /// Starts a request with `system` as the first message, followed by `history`.
    pub fn new(system: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(history);
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>, choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = choice;
        self
    }
}

/// Incremental piece of a streamed model response.
///
/// `tool_arguments` is a raw fragment of the argument JSON and is usually not valid JSON on its
/// own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelChunk {
    pub text: Option<String>,
    pub tool_name: Option<String>,
    pub tool_arguments: Option<String>,
}

impl ModelChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool_name(name: impl Into<String>) -> Self {
        Self {
            tool_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn tool_arguments(fragment: impl Into<String>) -> Self {
        Self {
            tool_arguments: Some(fragment.into()),
            ..Self::default()
        }

    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tool_name.is_none() && self.tool_arguments.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(String),
    #[error("model endpoint answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode model stream chunk: {0}")]
    Decode(String),
    #[error("model stream broke off: {0}")]
    Stream(String),
    #[error("model client is misconfigured: {0}")]
    Config(String),
}

pub type ModelStream = BoxStream<'static, Result<ModelChunk, ModelError>>;

#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Provider and model label for logs.
    fn describe(&self) -> String;

    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError>;
}
