// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::Value as JsonValue;

use crate::llm::{ChatMessage, Role};

pub const MAX_MESSAGES: usize = 50;
/// Per message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 10_000;
/// In bytes.
pub const MAX_CURRENT_XML_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request body is not valid JSON")]
    InvalidJson,
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("messages must be an array")]
    MessagesNotArray,
    #[error("messages must not be empty")]
    NoMessages,
    #[error("too many messages ({count}, at most {max})", max = MAX_MESSAGES)]
    TooManyMessages { count: usize },
    #[error("messages[{index}] must be an object")]
    MessageNotObject { index: usize },
    #[error("messages[{index}].role is invalid; it must be user or assistant")]
    InvalidRole { index: usize },
    #[error("messages[{index}].content must be a string")]
    ContentNotString { index: usize },
    #[error(
        "messages[{index}].content is too long (at most {max} characters)",
        max = MAX_MESSAGE_CHARS
    )]

    ContentTooLong { index: usize },
    #[error("currentXml must be a string")]
    CurrentXmlNotString,
    #[error("currentXml is too large (at most {} KB)", MAX_CURRENT_XML_BYTES / 1024)]
    CurrentXmlTooLarge,
}

/// A validated chat turn: the conversation so far and the diagram the client is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub current_xml: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, current_xml: Option<String>) -> Self {
        Self {
            messages,
            current_xml,
        }
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value: JsonValue =
            serde_json::from_slice(body).map_err(|_| RequestError::InvalidJson)?;
        Self::from_value(&value)
    }

    /// Checks shape and size limits field by field, reporting the first violation.
    pub fn from_value(body: &JsonValue) -> Result<Self, RequestError> {
        let body = body.as_object().ok_or(RequestError::NotAnObject)?;
        let raw_messages = body
            .get("messages")
            .and_then(JsonValue::as_array)
            .ok_or(RequestError::MessagesNotArray)?;
        if raw_messages.is_empty() {
            return Err(RequestError::NoMessages);
        }
        if raw_messages.len() > MAX_MESSAGES {
            return Err(RequestError::TooManyMessages {
                count: raw_messages.len(),
            });
        }

        let mut messages = Vec::with_capacity(raw_messages.len());
        for (index, raw) in raw_messages.iter().enumerate() {
            let raw = raw.as_object().ok_or(RequestError::MessageNotObject { index })?;
            let role = match raw.get("role").and_then(JsonValue::as_str) {
                Some("user") => Role::User,
                Some("assistant") => Role::Assistant,
                _ => return Err(RequestError::InvalidRole { index }),
            };
            let content = raw
                .get("content")
                .and_then(JsonValue::as_str)
                .ok_or(RequestError::ContentNotString { index })?;
            if content.chars().count() > MAX_MESSAGE_CHARS {
                return Err(RequestError::ContentTooLong { index });
            }
            messages.push(ChatMessage {
                role,
                content: content.to_owned(),
            });
        }

        let current_xml = match body.get("currentXml") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(xml)) if xml.is_empty() => None,
            Some(JsonValue::String(xml)) if xml.len() > MAX_CURRENT_XML_BYTES => {
                return Err(RequestError::CurrentXmlTooLarge)
            }
            Some(JsonValue::String(xml)) => Some(xml.clone()),
            Some(_) => return Err(RequestError::CurrentXmlNotString),
        };

        Ok(Self {
            messages,
            current_xml,
        })
    }
}
