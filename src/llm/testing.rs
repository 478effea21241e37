// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;

use super::{ModelChunk, ModelError, ModelRequest, ModelStream, ReasoningModel};

/// Replays a fixed chunk sequence and records the requests it saw.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    pub(crate) chunks: Vec<Result<ModelChunk, ModelError>>,
    pub(crate) refuse: Option<ModelError>,
    pub(crate) requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub(crate) fn new(chunks: Vec<ModelChunk>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Ok).collect(),
            ..Self::default()
        }

    }

    /// A single tool call whose arguments arrive in two fragments.
    pub(crate) fn tool_call(name: &str, arguments: serde_json::Value) -> Self {
        let raw = arguments.to_string();
        let (head, tail) = raw.split_at(raw.len() / 2);
        Self::new(vec![
            ModelChunk::tool_name(name),
            ModelChunk::tool_arguments(head),
            ModelChunk::tool_arguments(tail),
        ])
    }

    pub(crate) fn system_prompt(&self) -> String {
        self.requests
            .lock()
            .last()
            .map(|request| request.messages[0].content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningModel for ScriptedModel {
    fn describe(&self) -> String {
        "scripted".to_owned()
    }

    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        self.requests.lock().push(request);
        if let Some(err) = &self.refuse {
            return Err(err.clone());
        }
        Ok(stream::iter(self.chunks.clone()).boxed())
    }
}
