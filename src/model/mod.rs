// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: cell identities and the cell view used by the backend store.

pub mod cell;
pub mod ids;

pub use cell::Cell;
pub use ids::{is_reserved_cell_id, CellId, Id, IdError, CANVAS_CELL_ID, ROOT_CELL_ID};
