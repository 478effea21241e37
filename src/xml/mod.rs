// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! String-level handling of the draw.io (`mxGraph`) XML dialect.
//!
//! Nothing in here performs a full XML parse. The producer of cell fragments is a language
//! model that only promises a flat list of `<mxCell>` elements, and the editing backend wraps
//! its XML in free text, so every operation is a tolerant regex scan over the raw string.

use std::sync::OnceLock;

use regex::Regex;

mod envelope;
pub mod style;
mod validate;

pub use envelope::{
    clean_llm_content, extract_canvas_model, extract_cells, wrap_as_display_document,
    wrap_as_display_document_at, wrap_as_editable_model,
};
pub use style::{sanitize_edges, StyleMap};
pub use validate::{validate_cells, XmlValidationError};

/// Matches one `<mxCell>` element, self-closing or with a body, non-greedily.
pub(crate) fn cell_element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<mxCell\b[^>]*?(?:/>|>[\s\S]*?</mxCell\s*>)")
            .expect("valid mxCell pattern")
    })
}

/// Matches `name="value"` attribute pairs.
pub(crate) fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*"([^"]*)""#)
            .expect("valid attribute pattern")
    })
}

/// Iterates the serialized `<mxCell>` elements of `xml` in source order.
pub fn cell_elements(xml: &str) -> impl Iterator<Item = &str> {
    cell_element_regex().find_iter(xml).map(|m| m.as_str())
}

/// Returns the opening tag of an element (everything up to and including the first `>`).
pub(crate) fn opening_tag(element: &str) -> &str {
    match element.find('>') {
        Some(end) => &element[..=end],
        None => element,
    }
}

/// Reads an attribute from the opening tag of `element`.
pub fn attribute<'a>(element: &'a str, name: &str) -> Option<&'a str> {
    attribute_regex()
        .captures_iter(opening_tag(element))
        .find(|caps| &caps[1] == name)
        .and_then(|caps| caps.get(2))
        .map(|value| value.as_str())
}
