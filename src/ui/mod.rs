//! egui panels for tools, colors and export.
pub mod export_modal;
pub mod tool_panel;
pub mod top_bar;
