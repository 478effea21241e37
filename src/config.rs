// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Command line and environment configuration.

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::backend::McpConfig;
use crate::chat::TurnOptions;
use crate::llm::{ModelError, OpenAiModel, Provider};

#[derive(Debug, Parser)]
#[command(name = "drawchat", version, about = "Chat-driven draw.io diagram generation and editing")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// `serve` is the default when no subcommand is given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the chat HTTP API.
    Serve(ServeArgs),
    /// Serve the in-process diagram store as an MCP server on stdio.
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    Openai,
    Azure,
}

impl From<LlmProvider> for Provider {
    fn from(provider: LlmProvider) -> Self {
        match provider {
            LlmProvider::Openai => Provider::OpenAi,
            LlmProvider::Azure => Provider::Azure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Spawn the editing backend as an MCP child process.
    Mcp,
    /// Edit an in-process diagram store.
    Local,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address for the HTTP API.
    #[arg(long, env = "DRAWCHAT_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = LlmProvider::Openai)]
    pub llm_provider: LlmProvider,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o")]
    pub llm_model: String,

    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_endpoint: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT", default_value = "gpt-4o")]
    pub azure_deployment: String,

    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = "2024-08-01-preview")]
    pub azure_api_version: String,

    #[arg(long, value_enum, default_value_t = BackendKind::Mcp)]
    pub backend: BackendKind,

    /// Program that starts the MCP editing backend.
    #[arg(long, default_value = "npx")]
    pub mcp_command: String,

    /// Argument for `--mcp-command`; repeat for several.
    #[arg(
        long = "mcp-arg",
        allow_hyphen_values = true,
        default_values_t = ["-y".to_owned(), "@next-ai-drawio/mcp-server".to_owned()]
    )]
    pub mcp_args: Vec<String>,

    /// Return generated diagrams without rewriting connector styles.
    #[arg(long)]
    pub no_sanitize_edges: bool,
}

impl ServeArgs {
    pub fn model(&self) -> Result<OpenAiModel, ModelError> {
        match self.llm_provider.into() {
            Provider::OpenAi => OpenAiModel::openai(
                self.llm_base_url.as_deref(),
                self.llm_api_key.clone(),
                self.llm_model.clone(),
            ),
            Provider::Azure => OpenAiModel::azure(
                self.azure_endpoint.as_deref().unwrap_or_default(),
                &self.azure_deployment,
                &self.azure_api_version,
                self.llm_api_key.clone(),
            ),
        }
    }

    pub fn mcp_config(&self) -> McpConfig {
        McpConfig {
            command: self.mcp_command.clone(),
            args: self.mcp_args.clone(),
        }
    }

    pub fn turn_options(&self) -> TurnOptions {
        TurnOptions {
            sanitize_edges: !self.no_sanitize_edges,
        }
    }
}
