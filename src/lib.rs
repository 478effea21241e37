// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Drawchat: a chat assistant that draws and edits draw.io diagrams.
//!
//! A reasoning model answers each turn either with text or with one diagram tool call;
//! tool calls are validated and applied through an MCP editing backend.

pub mod backend;
pub mod chat;
pub mod config;
pub mod http;
pub mod llm;
pub mod model;
pub mod ops;
pub mod xml;
