// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Streaming client for OpenAI-compatible `chat/completions` endpoints (including Azure).

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use super::sse::{SseDecoder, SseFrame};
use super::{ModelChunk, ModelError, ModelRequest, ModelStream, ReasoningModel};

const DONE_SENTINEL: &str = "[DONE]";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Azure,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        }
    }
}

#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    ApiKey(String),
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct OpenAiModel {
    http: reqwest::Client,
    provider: Provider,
    url: String,
    model: String,
    auth: Auth,
}

impl OpenAiModel {
    /// Plain OpenAI-compatible endpoint; `base_url` defaults to the public OpenAI API.
    pub fn openai(
        base_url: Option<&str>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Ok(Self {
            http: http_client()?,
            provider: Provider::OpenAi,
            url: format!("{base_url}/chat/completions"),
            model: model.into(),
            auth: api_key.map_or(Auth::Anonymous, Auth::Bearer),
        })
    }

    /// Azure OpenAI deployment; the deployment name doubles as the model label.
    pub fn azure(
        endpoint: &str,
        deployment: &str,
        api_version: &str,
        api_key: Option<String>,
    ) -> Result<Self, ModelError> {
        let endpoint = endpoint.trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(ModelError::Config("azure endpoint is empty".to_owned()));
        }
        Ok(Self {
            http: http_client()?,
            provider: Provider::Azure,
            url: format!(
                "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
            ),
            model: deployment.to_owned(),
            auth: api_key.map_or(Auth::Anonymous, Auth::ApiKey),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn body(&self, request: &ModelRequest) -> JsonValue {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": true,
        });
        if !request.tools.is_empty() {
            let tools: Vec<JsonValue> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = JsonValue::Array(tools);
            body["tool_choice"] = json!(request.tool_choice);
        }
        body
    }
}

fn http_client() -> Result<reqwest::Client, ModelError> {
    reqwest::Client::builder()
        .user_agent(concat!("drawchat/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| ModelError::Config(format!("failed to build http client: {err}")))
}

#[async_trait]
impl ReasoningModel for OpenAiModel {
    fn describe(&self) -> String {
        format!("{} ({})", self.provider.as_str(), self.model)
    }

    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        info!(
            provider = self.provider.as_str(),
            model = %self.model,
            messages = request.messages.len(),
            "starting model stream"
        );
        let builder = self.http.post(&self.url).json(&self.body(&request));
        let builder = match &self.auth {
            Auth::Bearer(key) => builder.bearer_auth(key),
            Auth::ApiKey(key) => builder.header("api-key", key),
            Auth::Anonymous => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| ModelError::Http(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "model endpoint rejected request");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| ModelError::Stream(err.to_string()))
            })
            .boxed();
        Ok(decode_stream(bytes))
    }
}

struct DecodeState {
    bytes: BoxStream<'static, Result<Vec<u8>, ModelError>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<ModelChunk, ModelError>>,
    finished: bool,
}

impl DecodeState {
    fn enqueue(&mut self, frame: SseFrame) {
        if self.finished {
            return;
        }
        if frame.data.trim() == DONE_SENTINEL {
            debug!("model stream finished");
            self.finished = true;
            return;
        }
        match parse_chunk(&frame.data) {
            Ok(Some(chunk)) => self.pending.push_back(Ok(chunk)),
            Ok(None) => {}
            Err(err) => {
                self.finished = true;
                self.pending.push_back(Err(err));
            }
        }
    }
}

/// Turns raw event-stream bytes into [`ModelChunk`]s, stopping at the `[DONE]` sentinel.
pub fn decode_stream(bytes: BoxStream<'static, Result<Vec<u8>, ModelError>>) -> ModelStream {
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    for frame in state.decoder.push(&bytes) {
                        state.enqueue(frame);
                    }
                }
                Some(Err(err)) => {
                    state.pending.push_back(Err(err));
                    state.finished = true;
                }
                None => {
                    if let Some(frame) = state.decoder.finish() {
                        state.enqueue(frame);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Maps one `data:` payload onto a [`ModelChunk`]; `None` when it carries nothing usable
/// (e.g. Azure's leading content-filter frame).
///
/// Only the first choice and its first tool call are read.
pub fn parse_chunk(data: &str) -> Result<Option<ModelChunk>, ModelError> {
    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|err| ModelError::Decode(err.to_string()))?;
    let Some(delta) = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
    else {
        return Ok(None);
    };

    let function = delta
        .tool_calls
        .and_then(|calls| calls.into_iter().next())
        .and_then(|call| call.function);
    let (tool_name, tool_arguments) = match function {
        Some(function) => (
            function.name.filter(|name| !name.is_empty()),
            function.arguments.filter(|args| !args.is_empty()),
        ),
        None => (None, None),
    };
    let chunk = ModelChunk {
        text: delta.content.filter(|text| !text.is_empty()),
        tool_name,
        tool_arguments,
    };
    Ok((!chunk.is_empty()).then_some(chunk))
}
