// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Drawchat CLI entrypoint.
//!
//! By default this serves the chat API over HTTP. `drawchat backend` serves the
//! in-process diagram store as an MCP server over stdio instead.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drawchat::backend::{BackendServer, LocalBackend, McpBackend, ToolBackend};
use drawchat::chat::Orchestrator;
use drawchat::config::{BackendKind, Cli, Command, ServeArgs};
use drawchat::llm::Provider;

fn init_tracing() {
    // stdout carries the MCP protocol in backend mode.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let model = args.model().context("configuring the model client")?;
    info!(
        provider = Provider::from(args.llm_provider).as_str(),
        url = model.url(),
        "model configured"
    );


    let mcp = match args.backend {
        BackendKind::Mcp => Some(McpBackend::new(args.mcp_config())),
        BackendKind::Local => None,
    };
    let backend: Arc<dyn ToolBackend> = match &mcp {
        Some(mcp) => Arc::new(mcp.clone()),
        None => Arc::new(LocalBackend::new()),
    };

    let orchestrator = Orchestrator::new(Arc::new(model), backend)
        .with_options(args.turn_options());
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!(addr = %listener.local_addr()?, backend = ?args.backend, "serving chat API");

    axum::serve(listener, drawchat::http::router(orchestrator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    if let Some(mcp) = mcp {
        mcp.disconnect().await;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Backend => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(BackendServer::new(LocalBackend::new()).serve_stdio())
        }
        Command::Serve(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(serve(args))
        }
    }
}
