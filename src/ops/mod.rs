// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram creation and cell-addressed edit operations.
//!
//! Edits are defined relative to the state held by the editing backend; the document the
//! client sends along is advisory and only used as a fallback when the backend's state cannot
//! be read back.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, DiagramTools, ToolBackend};
use crate::model::CellId;
use crate::xml::{
    extract_canvas_model, extract_cells, validate_cells, wrap_as_display_document,
    wrap_as_editable_model, XmlValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Update,
    Add,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Add => "add",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell-addressed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EditOperation {
    /// The type of operation.
    pub operation: OperationKind,
    /// The ID of the cell to operate on.
    #[schemars(with = "String")]
    pub cell_id: CellId,
    /// Complete mxCell element for update/add operations. Not needed for delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_xml: Option<String>,
}

#[cfg(test)]
impl EditOperation {
    pub fn add(cell_id: &str, new_xml: &str) -> Self {
        Self::with_xml(OperationKind::Add, cell_id, Some(new_xml))
    }

    pub fn update(cell_id: &str, new_xml: &str) -> Self {
        Self::with_xml(OperationKind::Update, cell_id, Some(new_xml))
    }

    pub fn delete(cell_id: &str) -> Self {
        Self::with_xml(OperationKind::Delete, cell_id, None)
    }

    pub fn with_xml(operation: OperationKind, cell_id: &str, new_xml: Option<&str>) -> Self {
        Self {
            operation,
            cell_id: CellId::new(cell_id).expect("cell id"),
            new_xml: new_xml.map(str::to_owned),
        }
    }
}

/// Arguments of the `display_diagram` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DisplayDiagramParams {
    /// The mxCell elements to display. Generate ONLY mxCell elements, no wrapper tags. Use
    /// unique IDs starting from 2.
    pub xml: String,
}

/// Arguments of the `edit_diagram` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EditDiagramParams {
    /// List of edit operations to perform.
    pub operations: Vec<EditOperation>,
}

/// A display document produced by a create or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramResult {
    pub xml: String,
    /// The backend state could not be read back after an edit; `xml` is the caller's previous
    /// document, unchanged.
    pub recovered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("generated XML is malformed: {0}; please try again")]
    Validation(#[from] XmlValidationError),
    #[error("there is no diagram to edit; create a diagram first")]
    NoDiagramToEdit,
    #[error("failed to create diagram: {0}")]
    CreateFailed(String),
    #[error("failed to edit diagram: {0}")]
    EditFailed(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// Extracted create/edit flows against the editing backend.
include!("engine.rs");
