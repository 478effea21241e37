// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::xml::{attribute, cell_elements};

/// Read-only view of one serialized `<mxCell>` element.
///
/// Attributes are kept as raw strings because fragments come from an untrusted producer; the
/// original element text is retained so it can be written back byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    id: Option<String>,
    parent: Option<String>,
    source: Option<String>,
    target: Option<String>,
    xml: String,
}

impl Cell {
    pub fn parse(element: &str) -> Self {
        let owned = |name: &str| attribute(element, name).map(str::to_owned);
        Self {
            id: owned("id"),
            parent: owned("parent"),
            source: owned("source"),
            target: owned("target"),
            xml: element.to_owned(),
        }
    }

    /// All cells of a fragment, model or document, in source order.
    pub fn parse_all(xml: &str) -> Vec<Self> {
        cell_elements(xml).map(Self::parse).collect()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// `true` when both endpoints are set, whatever the `edge` flag says.
    pub fn is_connector(&self) -> bool {
        let set = |end: &Option<String>| end.as_deref().is_some_and(|id| !id.is_empty());
        set(&self.source) && set(&self.target)
    }

    /// `true` when this cell is a connector touching `id` at either end.
    pub fn connects(&self, id: &str) -> bool {
        self.source.as_deref() == Some(id) || self.target.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::Cell;

    #[test]
    fn parses_vertex_with_geometry() {
        let cells = Cell::parse_all(
            r#"<mxCell id="2" value="Start" vertex="1" parent="1"><mxGeometry x="40" y="40" width="120" height="60" as="geometry"/></mxCell>"#,
        );
        assert_eq!(cells.len(), 1);
        let cell = &cells[0];
        assert_eq!(cell.id(), Some("2"));
        assert_eq!(cell.parent(), Some("1"));
        assert!(!cell.is_connector());
        assert!(cell.xml().ends_with("</mxCell>"));
    }

    #[test]
    fn parses_edge_endpoints_from_opening_tag_only() {
        let cells = Cell::parse_all(
            r#"<mxCell id="5" edge="1" parent="1" source="2" target="3"><mxGeometry relative="1" as="geometry"><mxPoint x="1" y="2" as="sourcePoint"/></mxGeometry></mxCell>"#,
        );
        let cell = &cells[0];
        assert!(cell.is_connector());
        assert!(cell.connects("2"));
        assert!(cell.connects("3"));
        assert!(!cell.connects("5"));
    }

    #[test]
    fn dangling_edge_is_not_a_connector() {
        let cell = Cell::parse(r#"<mxCell id="5" edge="1" parent="1" source="2" target=""/>"#);
        assert!(!cell.is_connector());
        assert!(cell.connects("2"));
    }

    #[test]
    fn self_closing_cells_do_not_swallow_their_neighbours() {
        let cells = Cell::parse_all(
            r#"<mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="2" vertex="1" parent="1"><mxGeometry as="geometry"/></mxCell>"#,
        );
        let ids: Vec<_> = cells.iter().filter_map(Cell::id).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(cells[0].parent(), None);
    }
}
