//! Summary Calculator Module
//! Pure groupby-aggregate reductions over a filtered view. Every view of the
//! dashboard is a small summary table computed here; nothing in this module
//! mutates the dataset.

use crate::data::{FilteredView, OutcomeRecord, StatewideComparison};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Hospitals shown at each end of the ranking view.
pub const RANKING_DEPTH: usize = 10;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("no rows match the current filters")]
    EmptySelection,
}

/// Headline figures for the KPI cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_cases: i64,
    pub avg_observed_rate: Option<f64>,
    pub avg_obs_vs_expected: Option<f64>,
    /// Change of mean observed mortality between the two most recent years,
    /// in percent. Zero when fewer than two years exist or the base is zero.
    pub yoy_observed_change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeTrendPoint {
    pub year: i32,
    pub procedure: String,
    pub total_cases: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityTrendPoint {
    pub year: i32,
    pub observed: Option<f64>,
    pub expected: Option<f64>,
    pub risk_adjusted: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferenceTrendPoint {
    pub year: i32,
    pub avg_difference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureVolumeRow {
    pub procedure: String,
    pub total_cases: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureMortalityRow {
    pub procedure: String,
    pub observed: Option<f64>,
    pub expected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionDifferenceRow {
    pub region: String,
    pub avg_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMixRow {
    pub region: String,
    pub comparison: StatewideComparison,
    pub count: usize,
    /// Fraction of the region's categorized rows in this category.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalRankingRow {
    pub hospital: String,
    pub avg_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureCiRow {
    pub procedure: String,
    pub observed: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Asymmetric error magnitudes around the mean rate.
    pub error_below: f64,
    pub error_above: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalCiWidthRow {
    pub hospital: String,
    pub avg_ci_width: f64,
    pub total_cases: i64,
}

/// Per-row detail for the volume/mortality scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalScatterPoint {
    pub hospital: String,
    pub cases: i64,
    pub observed_rate: f64,
    pub comparison: Option<StatewideComparison>,
}

/// Everything the dashboard renders for one filter interaction.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub row_count: usize,
    pub kpis: KpiSummary,
    pub volume_trend: Vec<VolumeTrendPoint>,
    pub mortality_trend: Vec<MortalityTrendPoint>,
    pub difference_trend: Vec<DifferenceTrendPoint>,
    pub procedure_volume: Vec<ProcedureVolumeRow>,
    pub procedure_mortality: Vec<ProcedureMortalityRow>,
    pub region_difference: Vec<RegionDifferenceRow>,
    pub comparison_mix: Vec<ComparisonMixRow>,
    pub hospital_ranking: Vec<HospitalRankingRow>,
    pub procedure_ci: Vec<ProcedureCiRow>,
    pub hospital_ci_width: Vec<HospitalCiWidthRow>,
    pub scatter: Vec<HospitalScatterPoint>,
}

/// Running mean that ignores missing values.
#[derive(Default, Clone, Copy)]
struct MeanAcc {
    sum: f64,
    n: u32,
}

impl MeanAcc {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / f64::from(self.n))
    }
}

/// Computes the dashboard summary tables.
pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Reduce a filtered view to its summary. The empty view is the
    /// warning path: no aggregation runs over zero rows.
    pub fn compute(view: &FilteredView) -> Result<DashboardSummary, SummaryError> {
        if view.is_empty() {
            return Err(SummaryError::EmptySelection);
        }
        let rows: Vec<&OutcomeRecord> = view.iter().collect();
        let rows = rows.as_slice();

        // The view families are independent reductions; evaluate them
        // concurrently.
        let (kpis, (time_views, (category_views, hospital_views))) = rayon::join(
            || Self::kpis(rows),
            || {
                rayon::join(
                    || {
                        (
                            Self::volume_trend(rows),
                            Self::mortality_trend(rows),
                            Self::difference_trend(rows),
                        )
                    },
                    || {
                        rayon::join(
                            || {
                                (
                                    Self::procedure_volume(rows),
                                    Self::procedure_mortality(rows),
                                    Self::region_difference(rows),
                                    Self::comparison_mix(rows),
                                    Self::procedure_ci(rows),
                                )
                            },
                            || {
                                (
                                    Self::hospital_ranking(rows),
                                    Self::hospital_ci_width(rows),
                                    Self::scatter(rows),
                                )
                            },
                        )
                    },
                )
            },
        );
        let (volume_trend, mortality_trend, difference_trend) = time_views;
        let (procedure_volume, procedure_mortality, region_difference, comparison_mix, procedure_ci) =
            category_views;
        let (hospital_ranking, hospital_ci_width, scatter) = hospital_views;

        debug!(rows = rows.len(), "dashboard summary computed");

        Ok(DashboardSummary {
            row_count: rows.len(),
            kpis,
            volume_trend,
            mortality_trend,
            difference_trend,
            procedure_volume,
            procedure_mortality,
            region_difference,
            comparison_mix,
            hospital_ranking,
            procedure_ci,
            hospital_ci_width,
            scatter,
        })
    }

    fn kpis(rows: &[&OutcomeRecord]) -> KpiSummary {
        let total_cases = rows.iter().filter_map(|r| r.cases).sum();
        let avg_observed_rate = mean_of(rows.iter().filter_map(|r| r.observed_rate));
        let avg_obs_vs_expected = mean_of(rows.iter().filter_map(|r| r.obs_vs_expected));
        let yoy_observed_change_pct = Self::yoy_change(&Self::observed_means_by_year(rows));
        KpiSummary {
            total_cases,
            avg_observed_rate,
            avg_obs_vs_expected,
            yoy_observed_change_pct,
        }
    }

    /// Mean observed mortality per start year, ascending.
    fn observed_means_by_year(rows: &[&OutcomeRecord]) -> Vec<(i32, f64)> {
        let mut by_year: BTreeMap<i32, MeanAcc> = BTreeMap::new();
        for r in rows {
            if let Some(year) = r.start_year() {
                by_year.entry(year).or_default().add(r.observed_rate);
            }
        }
        by_year
            .into_iter()
            .filter_map(|(year, acc)| acc.mean().map(|m| (year, m)))
            .collect()
    }

    /// Percent change between the two most recent yearly means. Saturates to
    /// zero instead of dividing by zero or comparing a single year.
    pub fn yoy_change(year_means: &[(i32, f64)]) -> f64 {
        let n = year_means.len();
        if n < 2 {
            return 0.0;
        }
        let latest = year_means[n - 1].1;
        let previous = year_means[n - 2].1;
        if previous == 0.0 {
            0.0
        } else {
            (latest - previous) / previous * 100.0
        }
    }

    fn volume_trend(rows: &[&OutcomeRecord]) -> Vec<VolumeTrendPoint> {
        let mut acc: BTreeMap<(i32, &str), i64> = BTreeMap::new();
        for r in rows {
            if r.procedure.is_empty() {
                continue;
            }
            if let (Some(year), Some(cases)) = (r.start_year(), r.cases) {
                *acc.entry((year, r.procedure.as_str())).or_insert(0) += cases;
            }
        }
        acc.into_iter()
            .map(|((year, procedure), total_cases)| VolumeTrendPoint {
                year,
                procedure: procedure.to_string(),
                total_cases,
            })
            .collect()
    }

    fn mortality_trend(rows: &[&OutcomeRecord]) -> Vec<MortalityTrendPoint> {
        let mut acc: BTreeMap<i32, (MeanAcc, MeanAcc, MeanAcc)> = BTreeMap::new();
        for r in rows {
            if let Some(year) = r.start_year() {
                let entry = acc.entry(year).or_default();
                entry.0.add(r.observed_rate);
                entry.1.add(r.expected_rate);
                entry.2.add(r.risk_adjusted_rate);
            }
        }
        acc.into_iter()
            .map(|(year, (obs, exp, adj))| MortalityTrendPoint {
                year,
                observed: obs.mean(),
                expected: exp.mean(),
                risk_adjusted: adj.mean(),
            })
            .collect()
    }

    fn difference_trend(rows: &[&OutcomeRecord]) -> Vec<DifferenceTrendPoint> {
        let mut acc: BTreeMap<i32, MeanAcc> = BTreeMap::new();
        for r in rows {
            if let Some(year) = r.start_year() {
                acc.entry(year).or_default().add(r.obs_vs_expected);
            }
        }
        acc.into_iter()
            .map(|(year, diff)| DifferenceTrendPoint {
                year,
                avg_difference: diff.mean(),
            })
            .collect()
    }

    /// Total cases per procedure, largest first.
    fn procedure_volume(rows: &[&OutcomeRecord]) -> Vec<ProcedureVolumeRow> {
        let mut acc: BTreeMap<&str, i64> = BTreeMap::new();
        for r in rows {
            if r.procedure.is_empty() {
                continue;
            }
            if let Some(cases) = r.cases {
                *acc.entry(&r.procedure).or_insert(0) += cases;
            }
        }
        let mut out: Vec<ProcedureVolumeRow> = acc
            .into_iter()
            .map(|(procedure, total_cases)| ProcedureVolumeRow {
                procedure: procedure.to_string(),
                total_cases,
            })
            .collect();
        out.sort_by(|a, b| b.total_cases.cmp(&a.total_cases));
        out
    }

    fn procedure_mortality(rows: &[&OutcomeRecord]) -> Vec<ProcedureMortalityRow> {
        let mut acc: BTreeMap<&str, (MeanAcc, MeanAcc)> = BTreeMap::new();
        for r in rows {
            if r.procedure.is_empty() {
                continue;
            }
            let entry = acc.entry(&r.procedure).or_default();
            entry.0.add(r.observed_rate);
            entry.1.add(r.expected_rate);
        }
        acc.into_iter()
            .map(|(procedure, (obs, exp))| ProcedureMortalityRow {
                procedure: procedure.to_string(),
                observed: obs.mean(),
                expected: exp.mean(),
            })
            .collect()
    }

    /// Mean observed-vs-expected difference per region, best (most negative)
    /// first. Regions with no usable difference are omitted.
    fn region_difference(rows: &[&OutcomeRecord]) -> Vec<RegionDifferenceRow> {
        let mut acc: BTreeMap<&str, MeanAcc> = BTreeMap::new();
        for r in rows {
            if r.region.is_empty() {
                continue;
            }
            acc.entry(&r.region).or_default().add(r.obs_vs_expected);
        }
        let mut out: Vec<RegionDifferenceRow> = acc
            .into_iter()
            .filter_map(|(region, diff)| {
                diff.mean().map(|avg_difference| RegionDifferenceRow {
                    region: region.to_string(),
                    avg_difference,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.avg_difference
                .partial_cmp(&b.avg_difference)
                .unwrap_or(Ordering::Equal)
        });
        out
    }

    /// Per-region share of each comparison category among categorized rows.
    fn comparison_mix(rows: &[&OutcomeRecord]) -> Vec<ComparisonMixRow> {
        let mut counts: BTreeMap<&str, HashMap<StatewideComparison, usize>> = BTreeMap::new();
        for r in rows {
            if r.region.is_empty() {
                continue;
            }
            if let Some(comparison) = r.comparison {
                *counts
                    .entry(&r.region)
                    .or_default()
                    .entry(comparison)
                    .or_insert(0) += 1;
            }
        }
        let mut out = Vec::new();
        for (region, by_category) in counts {
            let total: usize = by_category.values().sum();
            for comparison in StatewideComparison::ALL {
                if let Some(&count) = by_category.get(&comparison) {
                    out.push(ComparisonMixRow {
                        region: region.to_string(),
                        comparison,
                        count,
                        share: count as f64 / total as f64,
                    });
                }
            }
        }
        out
    }

    /// Union of the best and worst `RANKING_DEPTH` hospitals by mean
    /// observed-vs-expected difference, deduplicated, sorted descending.
    /// Ties keep first-appearance order; hospitals with no usable difference
    /// are excluded.
    fn hospital_ranking(rows: &[&OutcomeRecord]) -> Vec<HospitalRankingRow> {
        let mut order: Vec<&str> = Vec::new();
        let mut acc: HashMap<&str, MeanAcc> = HashMap::new();
        for r in rows {
            if r.hospital_name.is_empty() || r.obs_vs_expected.is_none() {
                continue;
            }
            if !acc.contains_key(r.hospital_name.as_str()) {
                order.push(&r.hospital_name);
            }
            acc.entry(&r.hospital_name)
                .or_default()
                .add(r.obs_vs_expected);
        }

        let means: Vec<HospitalRankingRow> = order
            .into_iter()
            .filter_map(|hospital| {
                acc[hospital]
                    .mean()
                    .map(|avg_difference| HospitalRankingRow {
                        hospital: hospital.to_string(),
                        avg_difference,
                    })
            })
            .collect();

        let by_difference = |a: &HospitalRankingRow, b: &HospitalRankingRow| {
            a.avg_difference
                .partial_cmp(&b.avg_difference)
                .unwrap_or(Ordering::Equal)
        };

        let mut best = means.clone();
        best.sort_by(by_difference);
        let mut worst = means;
        worst.sort_by(|a, b| by_difference(b, a));

        let mut selected: Vec<HospitalRankingRow> = best.into_iter().take(RANKING_DEPTH).collect();
        for row in worst.into_iter().take(RANKING_DEPTH) {
            if !selected.iter().any(|s| s.hospital == row.hospital) {
                selected.push(row);
            }
        }
        selected.sort_by(|a, b| by_difference(b, a));
        selected
    }

    /// Mean observed rate and CI bounds per procedure with asymmetric error
    /// magnitudes. Procedures missing any of the three means are omitted.
    fn procedure_ci(rows: &[&OutcomeRecord]) -> Vec<ProcedureCiRow> {
        let mut acc: BTreeMap<&str, (MeanAcc, MeanAcc, MeanAcc)> = BTreeMap::new();
        for r in rows {
            if r.procedure.is_empty() {
                continue;
            }
            let entry = acc.entry(&r.procedure).or_default();
            entry.0.add(r.observed_rate);
            entry.1.add(r.ci_lower);
            entry.2.add(r.ci_upper);
        }
        acc.into_iter()
            .filter_map(|(procedure, (obs, lower, upper))| {
                match (obs.mean(), lower.mean(), upper.mean()) {
                    (Some(observed), Some(ci_lower), Some(ci_upper)) => Some(ProcedureCiRow {
                        procedure: procedure.to_string(),
                        observed,
                        ci_lower,
                        ci_upper,
                        error_below: observed - ci_lower,
                        error_above: ci_upper - observed,
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    /// Mean CI width vs. total cases per hospital, for the reliability
    /// scatter.
    fn hospital_ci_width(rows: &[&OutcomeRecord]) -> Vec<HospitalCiWidthRow> {
        let mut acc: BTreeMap<&str, (MeanAcc, i64)> = BTreeMap::new();
        for r in rows {
            if r.hospital_name.is_empty() {
                continue;
            }
            let entry = acc.entry(&r.hospital_name).or_default();
            entry.0.add(r.ci_width);
            entry.1 += r.cases.unwrap_or(0);
        }
        acc.into_iter()
            .filter_map(|(hospital, (width, total_cases))| {
                width.mean().map(|avg_ci_width| HospitalCiWidthRow {
                    hospital: hospital.to_string(),
                    avg_ci_width,
                    total_cases,
                })
            })
            .collect()
    }

    fn scatter(rows: &[&OutcomeRecord]) -> Vec<HospitalScatterPoint> {
        rows.iter()
            .filter_map(|r| match (r.cases, r.observed_rate) {
                (Some(cases), Some(observed_rate)) => Some(HospitalScatterPoint {
                    hospital: r.hospital_name.clone(),
                    cases,
                    observed_rate,
                    comparison: r.comparison,
                }),
                _ => None,
            })
            .collect()
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut acc = MeanAcc::default();
    for v in values {
        acc.add(Some(v));
    }
    acc.mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{blank_record, filter, Dataset, FilterSelection, YearSpan};

    fn record(
        year: i32,
        region: &str,
        procedure: &str,
        hospital: &str,
        cases: i64,
        observed: f64,
        expected: f64,
    ) -> OutcomeRecord {
        let mut r = blank_record();
        r.period = Some(YearSpan {
            start: year,
            end: year,
        });
        r.region = region.to_string();
        r.procedure = procedure.to_string();
        r.hospital_name = hospital.to_string();
        r.cases = Some(cases);
        r.observed_rate = Some(observed);
        r.expected_rate = Some(expected);
        r.obs_vs_expected = Some(observed - expected);
        r
    }

    fn full_view(dataset: &Dataset) -> FilteredView {
        filter::apply(dataset, &FilterSelection::all_of(dataset))
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let dataset = Dataset::new(vec![record(
            2015,
            "Capital District",
            "All PCI",
            "St. Elsewhere",
            10,
            2.0,
            2.0,
        )]);
        let selection = FilterSelection {
            hospital: Some("Nowhere Medical".to_string()),
            ..FilterSelection::all_of(&dataset)
        };
        let view = filter::apply(&dataset, &selection);
        assert!(view.is_empty());
        assert!(matches!(
            SummaryCalculator::compute(&view),
            Err(SummaryError::EmptySelection)
        ));
    }

    #[test]
    fn test_kpis_aggregate_and_skip_nulls() {
        let mut nullish = record(2015, "West", "All PCI", "Gap Memorial", 0, 0.0, 0.0);
        nullish.cases = None;
        nullish.observed_rate = None;
        nullish.obs_vs_expected = None;
        let dataset = Dataset::new(vec![
            record(2015, "West", "All PCI", "A", 100, 4.0, 3.0),
            record(2015, "West", "All PCI", "B", 300, 2.0, 3.0),
            nullish,
        ]);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");
        assert_eq!(summary.kpis.total_cases, 400);
        assert_eq!(summary.kpis.avg_observed_rate, Some(3.0));
        assert_eq!(summary.kpis.avg_obs_vs_expected, Some(0.0));
        assert_eq!(summary.row_count, 3);
    }

    #[test]
    fn test_yoy_change_saturates() {
        // A single year cannot be compared.
        assert_eq!(SummaryCalculator::yoy_change(&[(2015, 10.0)]), 0.0);
        // A zero base would divide by zero.
        assert_eq!(
            SummaryCalculator::yoy_change(&[(2014, 0.0), (2015, 10.0)]),
            0.0
        );
        // The ordinary case: 10.0 -> 12.0 is +20%.
        let change = SummaryCalculator::yoy_change(&[(2014, 10.0), (2015, 12.0)]);
        assert!((change - 20.0).abs() < 1e-9);
        // Only the two most recent years matter.
        let change = SummaryCalculator::yoy_change(&[(2013, 99.0), (2014, 10.0), (2015, 12.0)]);
        assert!((change - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_trends_are_year_ascending() {
        let dataset = Dataset::new(vec![
            record(2016, "West", "All PCI", "A", 10, 2.0, 2.0),
            record(2014, "West", "All PCI", "A", 20, 3.0, 2.0),
            record(2015, "West", "Non-Emergency PCI", "B", 30, 1.0, 2.0),
        ]);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");
        let years: Vec<i32> = summary.mortality_trend.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2014, 2015, 2016]);
        let volume_years: Vec<i32> = summary.volume_trend.iter().map(|p| p.year).collect();
        assert_eq!(volume_years, vec![2014, 2015, 2016]);
    }

    #[test]
    fn test_ranking_returns_each_hospital_once_sorted_descending() {
        let differences = [-5.0, -3.0, -1.0, 0.0, 2.0, 4.0, 6.0];
        let records: Vec<_> = differences
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                record(
                    2015,
                    "West",
                    "All PCI",
                    &format!("Hospital {i}"),
                    10,
                    10.0 + d,
                    10.0,
                )
            })
            .collect();
        let dataset = Dataset::new(records);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");

        // Fewer hospitals than 2 x RANKING_DEPTH: the union is the whole
        // population, exactly once each, in display order.
        let values: Vec<f64> = summary
            .hospital_ranking
            .iter()
            .map(|r| r.avg_difference)
            .collect();
        assert_eq!(values, vec![6.0, 4.0, 2.0, 0.0, -1.0, -3.0, -5.0]);
        let mut names: Vec<&str> = summary
            .hospital_ranking
            .iter()
            .map(|r| r.hospital.as_str())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), differences.len());
    }

    #[test]
    fn test_comparison_mix_shares_sum_to_one_per_region() {
        let mut higher = record(2015, "West", "All PCI", "A", 1, 5.0, 2.0);
        higher.comparison = Some(StatewideComparison::Higher);
        let mut lower = record(2015, "West", "All PCI", "B", 1, 1.0, 2.0);
        lower.comparison = Some(StatewideComparison::Lower);
        let mut usual = record(2015, "West", "All PCI", "C", 1, 2.0, 2.0);
        usual.comparison = Some(StatewideComparison::NotDifferent);
        // Uncategorized rows stay out of the mix entirely.
        let uncategorized = record(2015, "West", "All PCI", "D", 1, 2.0, 2.0);

        let dataset = Dataset::new(vec![higher, lower, usual, uncategorized]);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");

        let total_share: f64 = summary.comparison_mix.iter().map(|m| m.share).sum();
        assert!((total_share - 1.0).abs() < 1e-9);
        assert_eq!(summary.comparison_mix.len(), 3);
        for row in &summary.comparison_mix {
            assert!((row.share - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_procedure_ci_errors_are_non_negative() {
        let mut a = record(2015, "West", "All PCI", "A", 10, 3.0, 2.0);
        a.ci_lower = Some(1.0);
        a.ci_upper = Some(6.0);
        let mut b = record(2015, "West", "All PCI", "B", 10, 5.0, 2.0);
        b.ci_lower = Some(2.0);
        b.ci_upper = Some(7.0);

        let dataset = Dataset::new(vec![a, b]);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");
        assert_eq!(summary.procedure_ci.len(), 1);
        let row = &summary.procedure_ci[0];
        assert_eq!(row.observed, 4.0);
        assert_eq!(row.ci_lower, 1.5);
        assert_eq!(row.ci_upper, 6.5);
        assert_eq!(row.error_below, 2.5);
        assert_eq!(row.error_above, 2.5);
        assert!(row.error_below >= 0.0 && row.error_above >= 0.0);
    }

    #[test]
    fn test_procedure_volume_sorted_by_total_descending() {
        let dataset = Dataset::new(vec![
            record(2015, "West", "All PCI", "A", 10, 2.0, 2.0),
            record(2015, "West", "Valve or Valve/CABG", "A", 50, 2.0, 2.0),
            record(2016, "West", "All PCI", "B", 15, 2.0, 2.0),
        ]);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");
        assert_eq!(
            summary.procedure_volume,
            vec![
                ProcedureVolumeRow {
                    procedure: "Valve or Valve/CABG".to_string(),
                    total_cases: 50,
                },
                ProcedureVolumeRow {
                    procedure: "All PCI".to_string(),
                    total_cases: 25,
                },
            ]
        );
    }

    #[test]
    fn test_summary_serializes_for_headless_output() {
        let dataset = Dataset::new(vec![record(2015, "West", "All PCI", "A", 10, 2.0, 2.0)]);
        let summary = SummaryCalculator::compute(&full_view(&dataset)).expect("summary");
        let json = serde_json::to_string(&summary).expect("serialize summary");
        assert!(json.contains("\"total_cases\":10"));
    }
}
