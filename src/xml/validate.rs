// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::OnceLock;

use regex::Regex;

/// Reason a cell fragment was rejected before it reached the editing backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlValidationError {
    #[error("XML content is empty")]
    EmptyInput,
    #[error("mxCell tags are not closed properly: found {open} opening and {close} closing tags")]
    UnbalancedTags { open: usize, close: usize },
    #[error("XML tags are not nested properly (depth {depth} at end of input)")]
    MalformedNesting { depth: i64 },
}

fn cell_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(/?)mxCell\b[^>]*>")
            .expect("valid mxCell tag pattern")
    })
}

fn any_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid tag pattern"))

}

/// Approximate syntactic check of a bare `<mxCell>` fragment.
///
/// Only tag balance is verified: attribute values, `source`/`target` references and
/// geometry are not looked at, so a balanced but otherwise broken fragment passes here and
/// fails later in the rendering widget.
pub fn validate_cells(fragment: &str) -> Result<(), XmlValidationError> {
    if fragment.trim().is_empty() {
        return Err(XmlValidationError::EmptyInput);
    }

    let (mut open, mut close) = (0usize, 0usize);
    for caps in cell_tag_regex().captures_iter(fragment) {
        let tag = caps.get(0).map_or("", |m| m.as_str());
        if !caps[1].is_empty() {
            close += 1;
        } else if !tag.ends_with("/>") {
            open += 1;
        }
    }
    if open != close {
        return Err(XmlValidationError::UnbalancedTags { open, close });
    }

    let wrapped = format!("<root>{fragment}</root>");
    let mut depth: i64 = 0;
    for tag in any_tag_regex().find_iter(&wrapped).map(|m| m.as_str()) {
        if tag.starts_with("</") {
            depth -= 1;
        } else if !tag.ends_with("/>") {
            depth += 1;
        }
        if depth < 0 {
            return Err(XmlValidationError::MalformedNesting { depth });
        }
    }
    if depth != 0 {
        return Err(XmlValidationError::MalformedNesting { depth });
    }

    Ok(())
}
