// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! Shown under the viewer. Clicking the active tool again puts it down, so
//! at most one drawing tool is selected.

use crate::app::Tool;

/// Display the tool buttons.
pub fn show(ui: &mut egui::Ui, current_tool: &mut Option<Tool>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        for tool in Tool::ALL {
            let label = match tool {
                Tool::Circle => "◯ Circle",
                Tool::Rectangle => "▭ Rectangle",
                Tool::Arrow => "➔ Arrow",
            };
            if ui.selectable_label(*current_tool == Some(tool), label).clicked() {
                toggle(current_tool, tool);
            }
        }

        ui.separator();

        let tool_text = match current_tool {
            None => "Pick a tool to draw on the frame",
            Some(Tool::Circle) => "Drag across the circle's diameter",
            Some(Tool::Rectangle) => "Drag from one corner to the opposite corner",
            Some(Tool::Arrow) => "Drag from the tail to the point",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}

/// Select `tool`, or deselect it if it is already active.
pub fn toggle(current_tool: &mut Option<Tool>, tool: Tool) {
    *current_tool = if *current_tool == Some(tool) { None } else { Some(tool) };
}
