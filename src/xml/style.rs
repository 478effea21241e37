// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! `style` attribute handling and connector clean-up.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{attribute, attribute_regex, cell_element_regex, opening_tag};
use crate::model::Cell;

/// Routing keys every connector is forced to carry.
const REQUIRED_EDGE_STYLE: [(&str, &str); 5] = [
    ("edgeStyle", "orthogonalEdgeStyle"),
    ("rounded", "1"),
    ("orthogonalLoop", "1"),
    ("jettySize", "auto"),
    ("html", "1"),
];

/// Ordered view over a `key=value;` style string.
///
/// Keys keep their first position; a repeated key overwrites the earlier value. Bare tokens
/// (`ellipse;`) are kept with no value and written back without `=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, Option<String>)>,
}

impl StyleMap {
    pub fn parse(style: &str) -> Self {
        let mut map = Self::default();
        for segment in style.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            match segment.split_once('=') {
                Some((key, value)) => map.set(key.trim(), value),
                None => map.set_flag(segment),
            }
        }
        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.upsert(key, Some(value.to_owned()));
    }

    pub fn set_flag(&mut self, key: &str) {
        self.upsert(key, None);
    }

    fn upsert(&mut self, key: &str, value: Option<String>) {
        if key.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_owned(), value)),
        }
    }
}

impl std::fmt::Display for StyleMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.entries {
            match value {
                Some(value) => write!(f, "{key}={value};")?,
                None => write!(f, "{key};")?,
            }
        }
        Ok(())
    }
}

fn waypoint_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*<Array\b[^>]*?(?:/>|>[\s\S]*?</Array\s*>)")
            .expect("valid Array pattern")
    })
}

/// Forces orthogonal routing on every connector and drops its explicit waypoints.
///
/// A connector is any cell carrying both `source` and `target`. Other cells and any text
/// around them are left untouched.
pub fn sanitize_edges(xml: &str) -> Cow<'_, str> {
    cell_element_regex().replace_all(xml, |caps: &Captures<'_>| {
        let cell = &caps[0];
        if !Cell::parse(cell).is_connector() {
            return cell.to_owned();
        }
        sanitize_edge_cell(cell)
    })
}

fn sanitize_edge_cell(cell: &str) -> String {
    let tag = opening_tag(cell);
    let body = &cell[tag.len()..];

    let mut style = StyleMap::parse(attribute(cell, "style").unwrap_or_default());
    for (key, value) in REQUIRED_EDGE_STYLE {
        style.set(key, value);
    }
    let style = style.to_string();

    let mut replaced = false;
    let tag = attribute_regex().replace_all(tag, |caps: &Captures<'_>| {
        if &caps[1] == "style" && !replaced {
            replaced = true;
            format!(r#"style="{style}""#)
        } else {
            caps[0].to_owned()
        }
    });
    let tag = if replaced {
        tag.into_owned()
    } else {
        tag.replacen("<mxCell", &format!(r#"<mxCell style="{style}""#), 1)
    };

    let body = waypoint_array_regex().replace_all(body, "");
    format!("{tag}{body}")
}
