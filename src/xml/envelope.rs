// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use super::cell_elements;

const DOCUMENT_HOST: &str = "app.diagrams.net";
const DOCUMENT_AGENT: &str = "drawchat";

/// Wraps bare cells into the minimal `<mxGraphModel>` accepted by the backend's create call.
pub fn wrap_as_editable_model(cells_xml: &str) -> String {
    format!(
        r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/>{cells_xml}</root></mxGraphModel>"#
    )
}

/// Wraps bare cells into a full `<mxfile>` document stamped with the current time.
pub fn wrap_as_display_document(cells_xml: &str) -> String {
    wrap_as_display_document_at(cells_xml, Utc::now())
}

pub fn wrap_as_display_document_at(cells_xml: &str, modified: DateTime<Utc>) -> String {
    let modified = modified.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mxfile host="{DOCUMENT_HOST}" modified="{modified}" agent="{DOCUMENT_AGENT}" version="1.0">
  <diagram name="Page-1" id="page1">
    <mxGraphModel dx="0" dy="0" grid="1" gridSize="10" guides="1" tooltips="1" connect="1" arrows="1" fold="1" page="0" pageScale="1" pageWidth="1600" pageHeight="1200" background="none">
      <root>
        <mxCell id="0"/>
        <mxCell id="1" parent="0"/>
        {cells_xml}
      </root>
    </mxGraphModel>
  </diagram>
</mxfile>"#
    )
}

/// Lists the non-root cells of a model or document, one per line, in source order.
///
/// Any element whose serialized form mentions `id="0"` or `id="1"` is treated as one of the
/// fixed root cells and dropped.
pub fn extract_cells(xml: &str) -> String {
    cell_elements(xml)
        .filter(|cell| !cell.contains(r#"id="0""#) && !cell.contains(r#"id="1""#))
        .collect::<Vec<_>>()
        .join("\n")
}

fn canvas_model_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<mxGraphModel\b[\s\S]*</mxGraphModel\s*>")
            .expect("valid mxGraphModel pattern")
    })
}

/// Locates the `<mxGraphModel>` subtree inside arbitrary text (e.g. a backend tool response).
///
/// `None` means the state could not be recovered and callers keep their last known document.
pub fn extract_canvas_model(response_text: &str) -> Option<&str> {
    canvas_model_regex().find(response_text).map(|m| m.as_str())
}

/// Drops model free text that is really a serialized JSON object or array.
pub fn clean_llm_content(content: Option<&str>) -> String {
    let Some(content) = content else {
        return String::new();
    };
    let trimmed = content.trim();
    let looks_like_json = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if looks_like_json {
        return String::new();
    }
    content.to_owned()
}
