//! Dashboard View
//! Central scrollable panel: KPI cards on top, then the five chart sections.
//! Renders only what the summary calculator produced; an empty filter result
//! shows a warning banner instead.

use crate::charts::{palette, ChartPlotter};
use crate::stats::{DashboardSummary, KpiSummary};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 14.0;

/// Central dashboard area.
pub struct DashboardView {
    summary: Option<DashboardSummary>,
    empty_warning: bool,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            summary: None,
            empty_warning: false,
        }
    }
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.summary = None;
        self.empty_warning = false;
    }

    pub fn set_summary(&mut self, summary: DashboardSummary) {
        self.summary = Some(summary);
        self.empty_warning = false;
    }

    /// Switch to the empty-result warning; drops any previous charts.
    pub fn show_empty_warning(&mut self) {
        self.summary = None;
        self.empty_warning = true;
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        if self.empty_warning {
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .stroke(egui::Stroke::new(1.5, palette::ACCENT_NEGATIVE))
                .rounding(8.0)
                .inner_margin(12.0)
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(
                            "No data available for the selected filters. \
                             Please adjust your selections.",
                        )
                        .size(14.0)
                        .color(palette::ACCENT_NEGATIVE),
                    );
                });
            return;
        }

        let Some(summary) = &self.summary else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0).color(Color32::GRAY));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Key Performance Indicators");
                ui.add_space(6.0);
                Self::kpi_row(ui, &summary.kpis);
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.heading("Overall Trends Over Time");
                ui.add_space(6.0);
                ui.columns(2, |cols| {
                    chart_card(&mut cols[0], "Procedure Volume Trend", |ui| {
                        ChartPlotter::draw_volume_trend(ui, &summary.volume_trend);
                    });
                    chart_card(&mut cols[1], "Mortality Rate Trends", |ui| {
                        ChartPlotter::draw_mortality_trend(ui, &summary.mortality_trend);
                    });
                });
                ui.add_space(8.0);
                chart_card(ui, "Observed vs. Expected Difference Trend", |ui| {
                    ChartPlotter::draw_difference_trend(ui, &summary.difference_trend);
                });
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.heading("Procedure-Specific Analysis");
                ui.add_space(6.0);
                ui.columns(2, |cols| {
                    chart_card(&mut cols[0], "Procedure Volume Breakdown", |ui| {
                        ChartPlotter::draw_procedure_volume(ui, &summary.procedure_volume);
                    });
                    chart_card(&mut cols[1], "Procedure Mortality Comparison", |ui| {
                        ChartPlotter::draw_procedure_mortality(ui, &summary.procedure_mortality);
                    });
                });
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.heading("Regional Performance Comparison");
                ui.add_space(6.0);
                ui.columns(2, |cols| {
                    chart_card(&mut cols[0], "Regional Mortality Performance", |ui| {
                        ChartPlotter::draw_region_difference(ui, &summary.region_difference);
                    });
                    chart_card(&mut cols[1], "Regional Comparison Results Breakdown", |ui| {
                        ChartPlotter::draw_comparison_mix(ui, &summary.comparison_mix);
                    });
                });
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.heading("Hospital-Level Performance & Outliers");
                ui.add_space(6.0);
                ui.columns(2, |cols| {
                    chart_card(&mut cols[0], "Mortality vs. Case Volume", |ui| {
                        ChartPlotter::draw_hospital_scatter(ui, &summary.scatter);
                    });
                    chart_card(&mut cols[1], "Best & Worst Hospitals by Difference", |ui| {
                        ChartPlotter::draw_hospital_ranking(ui, &summary.hospital_ranking);
                    });
                });
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.heading("Confidence Intervals & Data Reliability");
                ui.add_space(6.0);
                ui.columns(2, |cols| {
                    chart_card(&mut cols[0], "Mortality with Confidence Intervals", |ui| {
                        ChartPlotter::draw_procedure_ci(ui, &summary.procedure_ci);
                    });
                    chart_card(&mut cols[1], "CI Width vs. Case Volume", |ui| {
                        ChartPlotter::draw_ci_width_scatter(ui, &summary.hospital_ci_width);
                    });
                });
                ui.add_space(SECTION_SPACING);
            });
    }

    fn kpi_row(ui: &mut egui::Ui, kpis: &KpiSummary) {
        let neutral = ui.visuals().text_color();

        let diff_color = kpis
            .avg_obs_vs_expected
            .map(palette::direction_color)
            .unwrap_or(neutral);

        let yoy = kpis.yoy_observed_change_pct;
        let yoy_arrow = if yoy > 0.0 {
            " \u{25b2}"
        } else if yoy < 0.0 {
            " \u{25bc}"
        } else {
            ""
        };
        let yoy_color = if yoy == 0.0 {
            neutral
        } else {
            palette::direction_color(yoy)
        };

        ui.columns(4, |cols| {
            kpi_card(
                &mut cols[0],
                "Total Procedures Performed",
                group_thousands(kpis.total_cases),
                neutral,
            );
            kpi_card(
                &mut cols[1],
                "Avg. Observed Mortality Rate",
                format_rate(kpis.avg_observed_rate),
                neutral,
            );
            kpi_card(
                &mut cols[2],
                "Avg. Obs. vs Exp. Difference",
                format_rate(kpis.avg_obs_vs_expected),
                diff_color,
            );
            kpi_card(
                &mut cols[3],
                "YoY Avg. Mortality Change",
                format!("{yoy:.2}%{yoy_arrow}"),
                yoy_color,
            );
        });
    }
}

fn chart_card(ui: &mut egui::Ui, title: &str, draw: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .rounding(8.0)
        .stroke(egui::Stroke::new(1.0, palette::PRIMARY))
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.label(RichText::new(title).size(14.0).strong());
            ui.add_space(6.0);
            draw(ui);
        });
}

fn kpi_card(ui: &mut egui::Ui, label: &str, value: String, value_color: Color32) {
    egui::Frame::none()
        .rounding(10.0)
        .stroke(egui::Stroke::new(1.0, palette::PRIMARY))
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.label(
                    RichText::new(label)
                        .size(12.0)
                        .strong()
                        .color(palette::PRIMARY),
                );
                ui.add_space(4.0);
                ui.label(RichText::new(value).size(22.0).strong().color(value_color));
            });
        });
}

fn format_rate(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "-".to_string(),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
