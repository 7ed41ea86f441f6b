//! Typed record model for the cardiac outcomes dataset.
//! One record per hospital x procedure x reporting period.

use serde::Serialize;
use std::sync::Arc;

/// Inclusive reporting period parsed from the discharge-year column.
/// `start == end` when the source was a single year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSpan {
    pub start: i32,
    pub end: i32,
}

impl YearSpan {
    /// Parse `"YYYY"` or `"YYYY-YYYY"`. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.split_once('-') {
            Some((lo, hi)) => {
                let start = lo.trim().parse().ok()?;
                let end = hi.trim().parse().ok()?;
                Some(Self { start, end })
            }
            None => {
                let year = raw.parse().ok()?;
                Some(Self {
                    start: year,
                    end: year,
                })
            }
        }
    }

    /// Midpoint year, floored for even-length spans.
    pub fn midpoint(&self) -> i32 {
        (self.start + self.end).div_euclid(2)
    }
}

/// Verdict of how a hospital's rate compares to the statewide rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatewideComparison {
    Higher,
    Lower,
    NotDifferent,
}

impl StatewideComparison {
    pub const ALL: [Self; 3] = [Self::Higher, Self::NotDifferent, Self::Lower];

    /// Map a source label to its category. Unknown labels are `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Rate higher than Statewide Rate" => Some(Self::Higher),
            "Rate lower than Statewide Rate" => Some(Self::Lower),
            "Rate not different than Statewide Rate" => Some(Self::NotDifferent),
            _ => None,
        }
    }

    /// The exact label used by the source data and in legends.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Higher => "Rate higher than Statewide Rate",
            Self::Lower => "Rate lower than Statewide Rate",
            Self::NotDifferent => "Rate not different than Statewide Rate",
        }
    }
}

/// One reported outcome row. Unparsable cells are `None`; rows are never
/// dropped at ingestion. Derived fields are filled once by the loader and
/// never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub facility_id: Option<i64>,
    pub hospital_name: String,
    pub region: String,
    pub procedure: String,
    /// Raw discharge-period string as reported.
    pub discharge_period: String,
    pub period: Option<YearSpan>,
    pub cases: Option<i64>,
    pub deaths: Option<i64>,
    pub observed_rate: Option<f64>,
    pub expected_rate: Option<f64>,
    pub risk_adjusted_rate: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub comparison: Option<StatewideComparison>,
    pub obs_vs_expected: Option<f64>,
    pub obs_vs_risk_adjusted: Option<f64>,
    pub ci_width: Option<f64>,
}

impl OutcomeRecord {
    pub fn is_higher_than_statewide(&self) -> bool {
        self.comparison == Some(StatewideComparison::Higher)
    }

    pub fn is_lower_than_statewide(&self) -> bool {
        self.comparison == Some(StatewideComparison::Lower)
    }

    pub fn is_not_different_from_statewide(&self) -> bool {
        self.comparison == Some(StatewideComparison::NotDifferent)
    }

    /// Start year of the reporting period, if it parsed.
    pub fn start_year(&self) -> Option<i32> {
        self.period.map(|p| p.start)
    }
}

/// The immutable base table. Cheap to clone; worker threads share the same
/// storage through the `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[OutcomeRecord]>,
}

impl Dataset {
    pub fn new(records: Vec<OutcomeRecord>) -> Self {
        Self {
            records: Arc::from(records),
        }
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when both handles point at the same underlying storage.
    pub fn shares_storage_with(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Min/max of the distinct start years present, or `None` when no row
    /// has a parsed period.
    pub fn year_domain(&self) -> Option<(i32, i32)> {
        let mut domain: Option<(i32, i32)> = None;
        for year in self.records.iter().filter_map(OutcomeRecord::start_year) {
            domain = Some(match domain {
                Some((lo, hi)) => (lo.min(year), hi.max(year)),
                None => (year, year),
            });
        }
        domain
    }
}

/// All-null record for building test fixtures field by field.
#[cfg(test)]
pub(crate) fn blank_record() -> OutcomeRecord {
    OutcomeRecord {
        facility_id: None,
        hospital_name: String::new(),
        region: String::new(),
        procedure: String::new(),
        discharge_period: String::new(),
        period: None,
        cases: None,
        deaths: None,
        observed_rate: None,
        expected_rate: None,
        risk_adjusted_rate: None,
        ci_lower: None,
        ci_upper: None,
        comparison: None,
        obs_vs_expected: None,
        obs_vs_risk_adjusted: None,
        ci_width: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2015", Some((2015, 2015, 2015)); "single year")]
    #[test_case("2015-2017", Some((2015, 2017, 2016)); "range")]
    #[test_case(" 2010 - 2012 ", Some((2010, 2012, 2011)); "range with spaces")]
    #[test_case("abc", None; "garbage")]
    #[test_case("", None; "empty")]
    #[test_case("2015-abc", None; "bad end year")]
    fn test_year_span_parse(raw: &str, expected: Option<(i32, i32, i32)>) {
        let parsed = YearSpan::parse(raw).map(|s| (s.start, s.end, s.midpoint()));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_comparison_labels_round_trip() {
        for comparison in StatewideComparison::ALL {
            assert_eq!(
                StatewideComparison::parse(comparison.label()),
                Some(comparison)
            );
        }
        assert_eq!(StatewideComparison::parse("Rate unknown"), None);
    }

    #[test]
    fn test_comparison_flags_are_exclusive() {
        for comparison in StatewideComparison::ALL {
            let record = OutcomeRecord {
                comparison: Some(comparison),
                ..blank_record()
            };
            let flags = [
                record.is_higher_than_statewide(),
                record.is_lower_than_statewide(),
                record.is_not_different_from_statewide(),
            ];
            assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        }
    }

    #[test]
    fn test_year_domain_skips_unparsed_periods() {
        let mut a = blank_record();
        a.period = Some(YearSpan {
            start: 2011,
            end: 2011,
        });
        let mut b = blank_record();
        b.period = Some(YearSpan {
            start: 2016,
            end: 2018,
        });
        let c = blank_record();
        let dataset = Dataset::new(vec![a, b, c]);
        assert_eq!(dataset.year_domain(), Some((2011, 2016)));
    }
}
