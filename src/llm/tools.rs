// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::ops::{DisplayDiagramParams, EditDiagramParams};

pub const DISPLAY_DIAGRAM: &str = "display_diagram";
pub const EDIT_DIAGRAM: &str = "edit_diagram";

const DISPLAY_DIAGRAM_DESCRIPTION: &str = r#"Display a NEW diagram on draw.io. Use this when creating a diagram from scratch or when the structure changes substantially.

IMPORTANT: Generate ONLY mxCell elements. Do NOT add <mxfile>, <mxGraphModel> or <root>; the wrapper is added automatically.

Example:
<mxCell id="2" value="Start" style="ellipse;whiteSpace=wrap;html=1;fillColor=#d5e8d4;strokeColor=#82b366;" vertex="1" parent="1">
  <mxGeometry x="340" y="40" width="120" height="60" as="geometry"/>
</mxCell>
<mxCell id="3" value="Process" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="1">
  <mxGeometry x="340" y="140" width="120" height="60" as="geometry"/>
</mxCell>"#;

const EDIT_DIAGRAM_DESCRIPTION: &str = r#"Edit parts of the EXISTING diagram. Use this for targeted changes: adding or removing elements, changing labels, colors or positions.

Operations:
- update: replace an existing cell. Provide cell_id and new_xml (a complete mxCell element).
- add: add a new cell. Provide cell_id (a new unique id) and new_xml.
- delete: remove a cell by id. Children and connected edges are deleted too.

IMPORTANT: JSON-escape every quote inside new_xml as \""#;

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: JsonValue,
}

impl ToolDefinition {
    fn for_params<T: JsonSchema>(name: &str, description: &str) -> Self {
        let mut parameters = schemars::schema_for!(T).to_value();
        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            parameters,
        }

    }
}

/// `display_diagram` and `edit_diagram`, in that order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::for_params::<DisplayDiagramParams>(
            DISPLAY_DIAGRAM,
            DISPLAY_DIAGRAM_DESCRIPTION,
        ),
        ToolDefinition::for_params::<EditDiagramParams>(EDIT_DIAGRAM, EDIT_DIAGRAM_DESCRIPTION),
    ]
}
