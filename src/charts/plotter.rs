//! Chart Plotter Module
//! Draws the dashboard's chart views with egui_plot. Every function is a
//! pure rendering of one summary table; nothing here computes aggregates.

use crate::charts::palette;
use crate::data::StatewideComparison;
use crate::stats::{
    DifferenceTrendPoint, HospitalCiWidthRow, HospitalRankingRow, HospitalScatterPoint,
    MortalityTrendPoint, ProcedureCiRow, ProcedureMortalityRow, ProcedureVolumeRow,
    RegionDifferenceRow, VolumeTrendPoint,
};
use egui_plot::{Bar, BarChart, GridMark, HLine, Legend, Line, LineStyle, Plot, PlotPoints, Points, VLine};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const CHART_HEIGHT: f32 = 280.0;
const LABEL_WIDTH: usize = 28;

/// Draws the dashboard chart views.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Case volume per year, one line per procedure.
    pub fn draw_volume_trend(ui: &mut egui::Ui, points: &[VolumeTrendPoint]) {
        let mut by_procedure: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
        for p in points {
            by_procedure
                .entry(&p.procedure)
                .or_default()
                .push([f64::from(p.year), p.total_cases as f64]);
        }

        Plot::new("volume_trend")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Total Cases")
            .x_axis_formatter(year_formatter)
            .show(ui, |plot_ui| {
                for (i, (procedure, series)) in by_procedure.into_iter().enumerate() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(series))
                            .color(palette::procedure_color(procedure, i))
                            .width(2.0)
                            .name(procedure),
                    );
                }
            });
    }

    /// Mean observed/expected/risk-adjusted mortality per year.
    pub fn draw_mortality_trend(ui: &mut egui::Ui, points: &[MortalityTrendPoint]) {
        let observed: Vec<[f64; 2]> = points
            .iter()
            .filter_map(|p| p.observed.map(|v| [f64::from(p.year), v]))
            .collect();
        let expected: Vec<[f64; 2]> = points
            .iter()
            .filter_map(|p| p.expected.map(|v| [f64::from(p.year), v]))
            .collect();
        let risk_adjusted: Vec<[f64; 2]> = points
            .iter()
            .filter_map(|p| p.risk_adjusted.map(|v| [f64::from(p.year), v]))
            .collect();

        Plot::new("mortality_trend")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Mortality Rate (%)")
            .x_axis_formatter(year_formatter)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(observed))
                        .color(palette::PRIMARY)
                        .width(2.0)
                        .name("Observed"),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(expected))
                        .color(palette::NEUTRAL_DARK)
                        .width(1.5)
                        .style(LineStyle::Dashed { length: 8.0 })
                        .name("Expected"),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(risk_adjusted))
                        .color(palette::SECONDARY_ACCENT)
                        .width(1.5)
                        .style(LineStyle::Dotted { spacing: 6.0 })
                        .name("Risk-Adjusted"),
                );
            });
    }

    /// Mean observed-vs-expected difference per year with a zero baseline.
    pub fn draw_difference_trend(ui: &mut egui::Ui, points: &[DifferenceTrendPoint]) {
        let series: Vec<[f64; 2]> = points
            .iter()
            .filter_map(|p| p.avg_difference.map(|v| [f64::from(p.year), v]))
            .collect();

        Plot::new("difference_trend")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label("Difference (%)")
            .x_axis_formatter(year_formatter)
            .show(ui, |plot_ui| {
                plot_ui.hline(
                    HLine::new(0.0)
                        .color(palette::NEUTRAL_DARK)
                        .style(LineStyle::Dotted { spacing: 4.0 }),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(series))
                        .color(palette::PRIMARY)
                        .width(2.0)
                        .name("Observed - Expected"),
                );
            });
    }

    /// Total cases per procedure.
    pub fn draw_procedure_volume(ui: &mut egui::Ui, rows: &[ProcedureVolumeRow]) {
        let labels: Vec<String> = rows.iter().map(|r| r.procedure.clone()).collect();

        Plot::new("procedure_volume")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .y_axis_label("Total Cases")
            .x_axis_formatter(category_formatter(labels))
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        Bar::new(i as f64, r.total_cases as f64)
                            .width(0.6)
                            .fill(palette::procedure_color(&r.procedure, i))
                            .name(&r.procedure)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Mean observed vs. expected mortality per procedure, grouped bars.
    pub fn draw_procedure_mortality(ui: &mut egui::Ui, rows: &[ProcedureMortalityRow]) {
        let labels: Vec<String> = rows.iter().map(|r| r.procedure.clone()).collect();

        Plot::new("procedure_mortality")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .y_axis_label("Mortality Rate (%)")
            .x_axis_formatter(category_formatter(labels))
            .show(ui, |plot_ui| {
                let mut observed = Vec::new();
                let mut expected = Vec::new();
                for (i, r) in rows.iter().enumerate() {
                    if let Some(v) = r.observed {
                        observed.push(Bar::new(i as f64 - 0.18, v).width(0.32).fill(palette::PRIMARY));
                    }
                    if let Some(v) = r.expected {
                        expected
                            .push(Bar::new(i as f64 + 0.18, v).width(0.32).fill(palette::NEUTRAL_DARK));
                    }
                }
                plot_ui.bar_chart(BarChart::new(observed).name("Observed"));
                plot_ui.bar_chart(BarChart::new(expected).name("Expected"));
            });
    }

    /// Mean observed-vs-expected difference per region, horizontal diverging
    /// bars around a zero line.
    pub fn draw_region_difference(ui: &mut egui::Ui, rows: &[RegionDifferenceRow]) {
        let labels: Vec<String> = rows.iter().map(|r| r.region.clone()).collect();
        let max_magnitude = rows
            .iter()
            .map(|r| r.avg_difference.abs())
            .fold(0.0, f64::max);

        Plot::new("region_difference")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Difference (%)")
            .y_axis_formatter(category_formatter(labels))
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        Bar::new(i as f64, r.avg_difference)
                            .width(0.6)
                            .fill(palette::diverging_color(r.avg_difference, max_magnitude))
                            .name(&r.region)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
                plot_ui.vline(
                    VLine::new(0.0)
                        .color(palette::NEUTRAL_DARK)
                        .style(LineStyle::Dotted { spacing: 4.0 }),
                );
            });
    }

    /// Share of hospitals per comparison category, stacked to 100% per
    /// region.
    pub fn draw_comparison_mix(ui: &mut egui::Ui, rows: &[crate::stats::ComparisonMixRow]) {
        let mut regions: Vec<&str> = Vec::new();
        for row in rows {
            if !regions.contains(&row.region.as_str()) {
                regions.push(&row.region);
            }
        }
        let labels: Vec<String> = regions.iter().map(|r| r.to_string()).collect();

        Plot::new("comparison_mix")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .y_axis_label("Share of Hospitals")
            .x_axis_formatter(category_formatter(labels))
            .y_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                format!("{:.0}%", mark.value * 100.0)
            })
            .show(ui, |plot_ui| {
                let mut base = vec![0.0f64; regions.len()];
                for comparison in StatewideComparison::ALL {
                    let mut bars = Vec::new();
                    for row in rows.iter().filter(|r| r.comparison == comparison) {
                        if let Some(x) = regions.iter().position(|&region| region == row.region) {
                            bars.push(
                                Bar::new(x as f64, row.share)
                                    .base_offset(base[x])
                                    .width(0.6)
                                    .fill(palette::comparison_color(Some(comparison))),
                            );
                            base[x] += row.share;
                        }
                    }
                    if !bars.is_empty() {
                        plot_ui.bar_chart(BarChart::new(bars).name(comparison.label()));
                    }
                }
            });
    }

    /// Observed mortality vs. case volume per row, log-scaled volume axis,
    /// colored by comparison category.
    pub fn draw_hospital_scatter(ui: &mut egui::Ui, points: &[HospitalScatterPoint]) {
        let categories: [(Option<StatewideComparison>, &str); 4] = [
            (Some(StatewideComparison::Higher), StatewideComparison::Higher.label()),
            (Some(StatewideComparison::NotDifferent), StatewideComparison::NotDifferent.label()),
            (Some(StatewideComparison::Lower), StatewideComparison::Lower.label()),
            (None, "Not categorized"),
        ];

        Plot::new("hospital_scatter")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Total Cases (log scale)")
            .y_axis_label("Observed Mortality Rate (%)")
            .x_axis_formatter(log_axis_formatter)
            .show(ui, |plot_ui| {
                for (comparison, name) in categories {
                    let series: Vec<[f64; 2]> = points
                        .iter()
                        .filter(|p| p.comparison == comparison && p.cases > 0)
                        .map(|p| [(p.cases as f64).log10(), p.observed_rate])
                        .collect();
                    if !series.is_empty() {
                        plot_ui.points(
                            Points::new(PlotPoints::from(series))
                                .radius(2.5)
                                .color(palette::comparison_color(comparison))
                                .name(name),
                        );
                    }
                }
            });
    }

    /// Best and worst hospitals by mean observed-vs-expected difference,
    /// horizontal diverging bars. Rows arrive sorted descending; the worst
    /// performer is drawn topmost.
    pub fn draw_hospital_ranking(ui: &mut egui::Ui, rows: &[HospitalRankingRow]) {
        let n = rows.len();
        let labels: Vec<String> = rows
            .iter()
            .rev()
            .map(|r| truncate_label(&r.hospital, LABEL_WIDTH))
            .collect();
        let max_magnitude = rows
            .iter()
            .map(|r| r.avg_difference.abs())
            .fold(0.0, f64::max);

        Plot::new("hospital_ranking")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Difference (%)")
            .y_axis_formatter(category_formatter(labels))
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        Bar::new((n - 1 - i) as f64, r.avg_difference)
                            .width(0.6)
                            .fill(palette::diverging_color(r.avg_difference, max_magnitude))
                            .name(&r.hospital)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
                plot_ui.vline(
                    VLine::new(0.0)
                        .color(palette::NEUTRAL_DARK)
                        .style(LineStyle::Dotted { spacing: 4.0 }),
                );
            });
    }

    /// Mean observed mortality per procedure with asymmetric CI whiskers.
    pub fn draw_procedure_ci(ui: &mut egui::Ui, rows: &[ProcedureCiRow]) {
        let labels: Vec<String> = rows.iter().map(|r| r.procedure.clone()).collect();

        Plot::new("procedure_ci")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .y_axis_label("Mortality Rate (%)")
            .x_axis_formatter(category_formatter(labels))
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        Bar::new(i as f64, r.observed)
                            .width(0.6)
                            .fill(palette::PRIMARY)
                            .name(&r.procedure)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars));

                for (i, r) in rows.iter().enumerate() {
                    let x = i as f64;
                    let whisker = vec![[x, r.ci_lower], [x, r.ci_upper]];
                    plot_ui.line(
                        Line::new(PlotPoints::from(whisker))
                            .color(palette::NEUTRAL_DARK)
                            .width(1.5),
                    );
                    for bound in [r.ci_lower, r.ci_upper] {
                        let cap = vec![[x - 0.08, bound], [x + 0.08, bound]];
                        plot_ui.line(
                            Line::new(PlotPoints::from(cap))
                                .color(palette::NEUTRAL_DARK)
                                .width(1.5),
                        );
                    }
                }
            });
    }

    /// Mean CI width vs. total cases per hospital, log-scaled volume axis.
    pub fn draw_ci_width_scatter(ui: &mut egui::Ui, rows: &[HospitalCiWidthRow]) {
        let series: Vec<[f64; 2]> = rows
            .iter()
            .filter(|r| r.total_cases > 0)
            .map(|r| [(r.total_cases as f64).log10(), r.avg_ci_width])
            .collect();

        Plot::new("ci_width_scatter")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Total Cases (log scale)")
            .y_axis_label("Avg. CI Width (%)")
            .x_axis_formatter(log_axis_formatter)
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from(series))
                        .radius(2.5)
                        .color(palette::PRIMARY)
                        .name("Hospitals"),
                );
            });
    }
}

/// Show whole years only; fractional grid marks stay blank.
fn year_formatter(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if (mark.value - mark.value.round()).abs() < 0.01 {
        format!("{:.0}", mark.value)
    } else {
        String::new()
    }
}

/// Label integer positions on a log10 axis with their power of ten.
fn log_axis_formatter(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if (mark.value - mark.value.round()).abs() < 1e-6 {
        format!("{:.0}", 10f64.powi(mark.value.round() as i32))
    } else {
        String::new()
    }
}

/// Map integer grid positions onto category labels.
fn category_formatter(
    labels: Vec<String>,
) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let rounded = mark.value.round();
        if rounded < 0.0 || (mark.value - rounded).abs() > 0.25 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
