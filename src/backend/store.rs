// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-process diagram state with cell-addressed mutation.

use std::collections::{BTreeSet, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{is_reserved_cell_id, Cell, CellId, IdError};
use crate::ops::{EditOperation, OperationKind};
use crate::xml::{cell_elements, validate_cells, wrap_as_editable_model, XmlValidationError};

/// Arguments of the backend's `create_new_diagram` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CreateDiagramParams {
    /// Complete `<mxGraphModel>` including the `0`/`1` root cells.
    pub xml: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("cell {index} has no id")]
    MissingId { index: usize },
    #[error("invalid cell id '{cell_id}': {reason}")]
    InvalidId { cell_id: String, reason: IdError },
    #[error("duplicate cell id '{cell_id}'")]
    DuplicateId { cell_id: String },
    #[error("cell id '{cell_id}' is reserved for the root cells")]
    ReservedId { cell_id: String },
    #[error("cell '{cell_id}' already exists")]
    AlreadyExists { cell_id: String },
    #[error("cell '{cell_id}' not found")]
    NotFound { cell_id: String },
    #[error("new_xml is required for {kind} of cell '{cell_id}'")]
    MissingXml { kind: OperationKind, cell_id: String },
    #[error("new_xml for cell '{cell_id}' is not a single mxCell element")]
    InvalidFragment { cell_id: String },
    #[error("new_xml is malformed: {0}")]
    Malformed(#[from] XmlValidationError),
    #[error("new_xml declares id '{found}' but the operation targets '{cell_id}'")]
    IdMismatch { cell_id: String, found: String },
    #[error("operation {index} ({kind} '{cell_id}') failed: {source}")]
    Operation {
        index: usize,
        kind: OperationKind,
        cell_id: String,
        #[source]
        source: Box<StoreError>,
    },
}

/// Cell ids touched by one applied batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<String>,
    /// Removed ids, descendants and attached connectors before the cell they hang off.
    pub removed: Vec<String>,
    pub updated: Vec<String>,
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: Vec<String>,
    removed: Vec<String>,
    updated: BTreeSet<String>,
}

impl DeltaBuilder {
    fn record_added(&mut self, cell_id: &str) {
        self.removed.retain(|id| id != cell_id);
        self.updated.remove(cell_id);
        self.added.push(cell_id.to_owned());
    }

    fn record_removed(&mut self, cell_id: &str) {
        let was_added = self.added.iter().any(|id| id == cell_id);
        self.added.retain(|id| id != cell_id);
        self.updated.remove(cell_id);
        if !was_added {
            self.removed.push(cell_id.to_owned());
        }
    }

    fn record_updated(&mut self, cell_id: &str) {
        if self.added.iter().any(|id| id == cell_id) {
            return;
        }
        self.updated.insert(cell_id.to_owned());
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added,
            removed: self.removed,
            updated: self.updated.into_iter().collect(),
        }
    }
}

/// Ordered, non-root cells of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramStore {
    cells: Vec<Cell>,
}

impl DiagramStore {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn contains(&self, cell_id: &str) -> bool {
        self.position(cell_id).is_some()
    }

    fn position(&self, cell_id: &str) -> Option<usize> {
        self.cells.iter().position(|cell| cell.id() == Some(cell_id))
    }

    /// Replaces the whole diagram with the cells of `model_xml`; the root cells are dropped.
    pub fn replace(&mut self, model_xml: &str) -> Result<usize, StoreError> {
        let mut seen = HashSet::new();
        let mut cells = Vec::new();
        for (index, cell) in Cell::parse_all(model_xml).into_iter().enumerate() {
            let Some(cell_id) = cell.id() else {
                return Err(StoreError::MissingId { index });
            };
            if is_reserved_cell_id(cell_id) {
                continue;
            }
            CellId::new(cell_id).map_err(|reason| StoreError::InvalidId {
                cell_id: cell_id.to_owned(),
                reason,
            })?;
            if !seen.insert(cell_id.to_owned()) {
                return Err(StoreError::DuplicateId {
                    cell_id: cell_id.to_owned(),
                });
            }
            cells.push(cell);
        }
        self.cells = cells;
        Ok(self.cells.len())
    }

    /// The store as an editable `<mxGraphModel>`.
    pub fn render(&self) -> String {
        let cells = self
            .cells
            .iter()
            .map(Cell::xml)
            .collect::<Vec<_>>()
            .join("\n");
        wrap_as_editable_model(&cells)
    }

    /// Applies `operations` in order; nothing is committed unless all of them succeed.
    pub fn apply(&mut self, operations: &[EditOperation]) -> Result<Delta, StoreError> {
        let mut working = self.clone();
        let mut delta = DeltaBuilder::default();
        for (index, operation) in operations.iter().enumerate() {
            working
                .apply_one(operation, &mut delta)
                .map_err(|source| StoreError::Operation {
                    index,
                    kind: operation.operation,
                    cell_id: operation.cell_id.to_string(),
                    source: Box::new(source),
                })?;
        }
        *self = working;
        Ok(delta.finish())
    }

    fn apply_one(
        &mut self,
        operation: &EditOperation,
        delta: &mut DeltaBuilder,
    ) -> Result<(), StoreError> {
        if operation.cell_id.is_reserved() {
            return Err(StoreError::ReservedId {
                cell_id: operation.cell_id.to_string(),
            });
        }
        let cell_id = operation.cell_id.as_str();

        match operation.operation {
            OperationKind::Add => {
                if self.contains(cell_id) {
                    return Err(StoreError::AlreadyExists {
                        cell_id: cell_id.to_owned(),
                    });
                }
                let cell = parse_replacement(operation)?;
                self.cells.push(cell);
                delta.record_added(cell_id);
            }
            OperationKind::Update => {
                let Some(position) = self.position(cell_id) else {
                    return Err(StoreError::NotFound {
                        cell_id: cell_id.to_owned(),
                    });
                };
                self.cells[position] = parse_replacement(operation)?;
                delta.record_updated(cell_id);
            }
            OperationKind::Delete => {
                if !self.contains(cell_id) {
                    return Err(StoreError::NotFound {
                        cell_id: cell_id.to_owned(),
                    });
                }
                let doomed: Vec<String> = self
                    .cascade(cell_id)
                    .into_iter()
                    .map(str::to_owned)
                    .collect();
                self.cells
                    .retain(|cell| !cell.id().is_some_and(|id| doomed.iter().any(|d| d == id)));
                for removed in &doomed {
                    delta.record_removed(removed);
                }
            }
        }
        Ok(())
    }

    /// Ids removed by deleting `cell_id`, bottom-up: the deepest dependants first and the
    /// cell itself last.
    ///
    /// Dependants are cells whose `parent` is already doomed and connectors whose `source`
    /// or `target` is, repeated until nothing new is found.
    fn cascade<'a>(&'a self, cell_id: &'a str) -> Vec<&'a str> {
        let mut doomed: Vec<&str> = vec![cell_id];
        let mut frontier = 0;
        while frontier < doomed.len() {
            let current = doomed[frontier];
            frontier += 1;
            for cell in &self.cells {
                let Some(id) = cell.id() else { continue };
                if doomed.contains(&id) {
                    continue;
                }
                if cell.parent() == Some(current) || cell.connects(current) {
                    doomed.push(id);
                }
            }
        }
        doomed.reverse();
        doomed
    }
}

fn parse_replacement(operation: &EditOperation) -> Result<Cell, StoreError> {
    let cell_id = operation.cell_id.as_str();
    let Some(new_xml) = operation
        .new_xml
        .as_deref()
        .filter(|xml| !xml.trim().is_empty())
    else {
        return Err(StoreError::MissingXml {
            kind: operation.operation,
            cell_id: cell_id.to_owned(),
        });
    };
    validate_cells(new_xml)?;

    let mut elements = cell_elements(new_xml);
    let (Some(element), None) = (elements.next(), elements.next()) else {
        return Err(StoreError::InvalidFragment {
            cell_id: cell_id.to_owned(),
        });
    };
    let cell = Cell::parse(element);
    match cell.id() {
        Some(found) if found == cell_id => Ok(cell),
        Some(found) => Err(StoreError::IdMismatch {
            cell_id: cell_id.to_owned(),
            found: found.to_owned(),
        }),
        None => Err(StoreError::InvalidFragment {
            cell_id: cell_id.to_owned(),
        }),
    }
}
