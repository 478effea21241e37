// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Drawchat and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Validates a bare cell fragment, hands it to the backend's create call and returns the
/// display document for it.
pub async fn display_diagram(
    backend: &dyn ToolBackend,
    cells_xml: &str,
) -> Result<DiagramResult, EditError> {
    if let Err(err) = validate_cells(cells_xml) {
        warn!(error = %err, "rejecting generated cells");
        return Err(err.into());
    }

    let tools = DiagramTools::new(backend);
    tools.start_session().await?;

    let output = tools
        .create_new_diagram(&wrap_as_editable_model(cells_xml))
        .await?;
    if output.is_error {
        let reason = output.diagnostic();
        warn!(%reason, "create_new_diagram reported an error");
        return Err(EditError::CreateFailed(reason));
    }

    Ok(DiagramResult {
        xml: wrap_as_display_document(cells_xml),
        recovered: false,
    })
}

/// Applies `operations` in order against the backend's current diagram.
///
/// Without a current document the batch is only accepted when every operation is an `add`;
/// it is then treated as a fresh creation from the concatenated fragments.
pub async fn apply_edits(
    backend: &dyn ToolBackend,
    operations: &[EditOperation],
    current_document: Option<&str>,
) -> Result<DiagramResult, EditError> {
    let Some(current_document) = current_document.filter(|doc| !doc.trim().is_empty()) else {
        return create_from_adds(backend, operations).await;
    };

    let tools = DiagramTools::new(backend);
    tools.start_session().await?;

    // The backend, not the client copy, is authoritative; refresh it before editing.
    tools.get_diagram().await?;

    let output = tools.edit_diagram(operations).await?;
    if output.is_error {
        let reason = output.diagnostic();
        warn!(%reason, operations = operations.len(), "edit_diagram reported an error");
        return Err(EditError::EditFailed(reason));
    }
    debug!(operations = operations.len(), "edit_diagram applied");

    let snapshot = tools.get_diagram().await?;
    let text = if snapshot.is_error {
        String::new()
    } else {
        snapshot.joined_text()
    };
    let Some(model) = extract_canvas_model(&text) else {
        warn!("could not read back the edited diagram; keeping the previous document");
        return Ok(DiagramResult {
            xml: current_document.to_owned(),
            recovered: true,
        });
    };

    Ok(DiagramResult {
        xml: wrap_as_display_document(&extract_cells(model)),
        recovered: false,
    })

}

async fn create_from_adds(
    backend: &dyn ToolBackend,
    operations: &[EditOperation],
) -> Result<DiagramResult, EditError> {
    let all_adds =
        !operations.is_empty() && operations.iter().all(|op| op.operation == OperationKind::Add);
    if !all_adds {
        return Err(EditError::NoDiagramToEdit);
    }

    let combined = operations
        .iter()
        .filter_map(|op| op.new_xml.as_deref())
        .filter(|xml| !xml.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if combined.is_empty() {
        return Err(EditError::NoDiagramToEdit);
    }

    info!(operations = operations.len(), "no current diagram and only adds; creating instead");
    display_diagram(backend, &combined).await
}
