// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

/// Identity of the synthetic document root cell.
pub const ROOT_CELL_ID: &str = "0";
/// Identity of the single canvas cell every top-level cell is parented at.
pub const CANVAS_CELL_ID: &str = "1";

/// A typed identifier as it appears inside an XML attribute value.
///
/// The value is kept verbatim (producers pick ids, e.g. `"2"` or `"new1"`); the only
/// requirement is that it is non-empty and can be written between double quotes without
/// escaping. Deserialization enforces the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: SmolStr,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdError> {
        let value = value.as_ref();
        validate_attribute_value(value)?;
        Ok(Self {
            value: SmolStr::new(value),
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("id must not be empty")]
    Empty,
    #[error("id must not contain {0:?}")]
    InvalidChar(char),
}

fn validate_attribute_value(value: &str) -> Result<(), IdError> {
    if value.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if let Some(ch) = value.chars().find(|ch| matches!(ch, '"' | '<' | '>' | '&')) {
        return Err(IdError::InvalidChar(ch));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellIdTag {}
pub type CellId = Id<CellIdTag>;

impl CellId {
    /// `true` for the two fixed root cells (`"0"` and `"1"`).
    pub fn is_reserved(&self) -> bool {
        is_reserved_cell_id(self.as_str())
    }
}

pub fn is_reserved_cell_id(value: &str) -> bool {
    value == ROOT_CELL_ID || value == CANVAS_CELL_ID
}
