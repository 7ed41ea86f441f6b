//! Control Panel Widget
//! Left side panel with the data source row and the cascading filter
//! controls. The widget edits a `FilterSelection`; the pipeline itself runs
//! in the app layer.

use crate::charts::palette;
use crate::data::{FilterOptions, FilterSelection, OVERALL};
use egui::{Color32, ComboBox, RichText, Slider};
use std::path::PathBuf;

const LABEL_WIDTH: f32 = 90.0;
const COMBO_WIDTH: f32 = 170.0;

/// Actions triggered by the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    FiltersChanged,
}

/// Left side control panel with the data source and filter widgets.
pub struct ControlPanel {
    /// Current filter choices; `None` until a dataset is loaded.
    pub selection: Option<FilterSelection>,
    /// Option domains recomputed by the last pipeline run.
    pub options: FilterOptions,
    pub data_path: Option<PathBuf>,
    pub status: String,
    pub row_count: usize,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            selection: None,
            options: FilterOptions::default(),
            data_path: None,
            status: "Ready".to_string(),
            row_count: 0,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the control panel.
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("CardioScope")
                    .size(22.0)
                    .color(palette::PRIMARY),
            );
            ui.label(
                RichText::new("Cardiac Care Performance")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .data_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.data_path.is_some() {
                            ui.visuals().text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("Filters").size(14.0).strong());
        ui.add_space(8.0);

        let mut changed = false;
        if let (Some(selection), Some((year_lo, year_hi))) =
            (self.selection.as_mut(), self.options.year_domain)
        {
            ui.label("Discharge years:");
            changed |= ui
                .add(Slider::new(&mut selection.years.0, year_lo..=year_hi).text("From"))
                .changed();
            changed |= ui
                .add(Slider::new(&mut selection.years.1, year_lo..=year_hi).text("To"))
                .changed();
            // Keep the range ordered while a handle is dragged across.
            if selection.years.0 > selection.years.1 {
                selection.years.0 = selection.years.1;
            }

            ui.add_space(8.0);

            changed |= sentinel_combo(
                ui,
                "region_select",
                "Region:",
                &mut selection.region,
                &self.options.regions,
            );
            ui.add_space(5.0);
            changed |= sentinel_combo(
                ui,
                "procedure_select",
                "Procedure:",
                &mut selection.procedure,
                &self.options.procedures,
            );
            ui.add_space(5.0);
            changed |= sentinel_combo(
                ui,
                "hospital_select",
                "Hospital:",
                &mut selection.hospital,
                &self.options.hospitals,
            );

            ui.add_space(10.0);
            if ui.button("Reset filters").clicked() {
                *selection = FilterSelection {
                    years: (year_lo, year_hi),
                    region: None,
                    procedure: None,
                    hospital: None,
                };
                changed = true;
            }
        } else {
            ui.label(RichText::new("Load a dataset to filter it.").color(Color32::GRAY));
        }

        if changed {
            action = ControlPanelAction::FiltersChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(
            RichText::new(format!("{} rows in view", self.row_count))
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(3.0);
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("No data") {
            palette::ACCENT_NEGATIVE
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Single-select combo offering the "Overall" sentinel first. Returns true
/// when the choice changed.
fn sentinel_combo(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    current: &mut Option<String>,
    values: &[String],
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(label));
        ComboBox::from_id_salt(id)
            .width(COMBO_WIDTH)
            .selected_text(current.clone().unwrap_or_else(|| OVERALL.to_string()))
            .show_ui(ui, |ui| {
                if ui.selectable_label(current.is_none(), OVERALL).clicked() && current.is_some() {
                    *current = None;
                    changed = true;
                }
                for value in values {
                    let selected = current.as_deref() == Some(value.as_str());
                    if ui.selectable_label(selected, value).clicked() && !selected {
                        *current = Some(value.clone());
                        changed = true;
                    }
                }
            });
    });
    changed
}
