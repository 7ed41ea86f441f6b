//! Cascading filter pipeline.
//! Four sequential stages (year range, region, procedure, hospital) where
//! each stage's rows feed the next stage's option list. Filtering produces
//! row-index views into the shared dataset; the base table is never touched.

use crate::data::record::{Dataset, OutcomeRecord};

/// Sentinel shown in the single-select widgets for "no filter".
pub const OVERALL: &str = "Overall";

/// Current user choices. `None` selections mean "Overall".
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    /// Inclusive start-year range.
    pub years: (i32, i32),
    pub region: Option<String>,
    pub procedure: Option<String>,
    pub hospital: Option<String>,
}

impl FilterSelection {
    /// Widest selection for a dataset: full year domain, everything overall.
    pub fn all_of(dataset: &Dataset) -> Self {
        let years = dataset.year_domain().unwrap_or((0, 0));
        Self {
            years,
            region: None,
            procedure: None,
            hospital: None,
        }
    }
}

/// Option domains recomputed per stage, so downstream widgets only offer
/// values that still exist upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Min/max of distinct start years in the base table.
    pub year_domain: Option<(i32, i32)>,
    pub regions: Vec<String>,
    pub procedures: Vec<String>,
    pub hospitals: Vec<String>,
}

/// Result of one pipeline run: the matching rows plus the option domains the
/// sidebar should offer next.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Dataset,
    rows: Vec<usize>,
    pub options: FilterOptions,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutcomeRecord> {
        let records = self.dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }
}

/// Run the four filter stages over the base table.
pub fn apply(dataset: &Dataset, selection: &FilterSelection) -> FilteredView {
    let records = dataset.records();
    let (lo, hi) = selection.years;

    let year_rows: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.start_year().is_some_and(|y| lo <= y && y <= hi))
        .map(|(i, _)| i)
        .collect();

    let regions = distinct_values(records, &year_rows, |r| &r.region);
    let region_rows = narrow(records, &year_rows, selection.region.as_deref(), |r| {
        &r.region
    });

    let procedures = distinct_values(records, &region_rows, |r| &r.procedure);
    let procedure_rows = narrow(records, &region_rows, selection.procedure.as_deref(), |r| {
        &r.procedure
    });

    let hospitals = distinct_values(records, &procedure_rows, |r| &r.hospital_name);
    let rows = narrow(records, &procedure_rows, selection.hospital.as_deref(), |r| {
        &r.hospital_name
    });

    tracing::debug!(
        total = records.len(),
        matched = rows.len(),
        "filter pipeline applied"
    );

    FilteredView {
        dataset: dataset.clone(),
        rows,
        options: FilterOptions {
            year_domain: dataset.year_domain(),
            regions,
            procedures,
            hospitals,
        },
    }
}

fn narrow(
    records: &[OutcomeRecord],
    rows: &[usize],
    choice: Option<&str>,
    field: impl Fn(&OutcomeRecord) -> &String,
) -> Vec<usize> {
    match choice {
        None => rows.to_vec(),
        Some(value) => rows
            .iter()
            .copied()
            .filter(|&i| field(&records[i]).as_str() == value)
            .collect(),
    }
}

fn distinct_values(
    records: &[OutcomeRecord],
    rows: &[usize],
    field: impl Fn(&OutcomeRecord) -> &String,
) -> Vec<String> {
    let mut values: Vec<String> = rows
        .iter()
        .map(|&i| field(&records[i]))
        .filter(|v| !v.is_empty())
        .cloned()
        .collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{blank_record, YearSpan};

    fn record(year: i32, region: &str, procedure: &str, hospital: &str) -> OutcomeRecord {
        OutcomeRecord {
            region: region.to_string(),
            procedure: procedure.to_string(),
            hospital_name: hospital.to_string(),
            period: Some(YearSpan {
                start: year,
                end: year,
            }),
            ..blank_record()
        }
    }

    fn sample_dataset() -> Dataset {
        let mut unparsed = record(0, "Capital District", "All PCI", "St. Elsewhere");
        unparsed.period = None;
        Dataset::new(vec![
            record(2014, "Capital District", "All PCI", "St. Elsewhere"),
            record(2014, "Capital District", "Valve or Valve/CABG", "Mercy General"),
            record(2015, "Hudson Valley", "All PCI", "Harbor View"),
            record(2016, "Hudson Valley", "Non-Emergency PCI", "Lakeside"),
            unparsed,
        ])
    }

    #[test]
    fn test_overall_selection_keeps_year_matched_rows() {
        let dataset = sample_dataset();
        let view = apply(&dataset, &FilterSelection::all_of(&dataset));
        // The row with an unparsable period never enters year filtering.
        assert_eq!(view.len(), 4);
        assert_eq!(view.options.year_domain, Some((2014, 2016)));
        assert_eq!(
            view.options.regions,
            vec!["Capital District".to_string(), "Hudson Valley".to_string()]
        );
    }

    #[test]
    fn test_options_cascade_from_upstream_stages() {
        let dataset = sample_dataset();
        let full = apply(&dataset, &FilterSelection::all_of(&dataset));

        let narrowed = apply(
            &dataset,
            &FilterSelection {
                years: (2015, 2016),
                region: None,
                procedure: None,
                hospital: None,
            },
        );

        // Narrower year range: every downstream option set is a subset.
        for region in &narrowed.options.regions {
            assert!(full.options.regions.contains(region));
        }
        assert_eq!(narrowed.options.regions, vec!["Hudson Valley".to_string()]);

        let by_region = apply(
            &dataset,
            &FilterSelection {
                years: (2014, 2016),
                region: Some("Capital District".to_string()),
                procedure: None,
                hospital: None,
            },
        );
        assert_eq!(
            by_region.options.procedures,
            vec!["All PCI".to_string(), "Valve or Valve/CABG".to_string()]
        );
        assert_eq!(
            by_region.options.hospitals,
            vec!["Mercy General".to_string(), "St. Elsewhere".to_string()]
        );
        assert_eq!(by_region.len(), 2);
    }

    #[test]
    fn test_stale_hospital_selection_yields_empty_view() {
        let dataset = sample_dataset();
        // Lakeside only reports in Hudson Valley; pinning it under Capital
        // District matches nothing and must not panic.
        let view = apply(
            &dataset,
            &FilterSelection {
                years: (2014, 2016),
                region: Some("Capital District".to_string()),
                procedure: None,
                hospital: Some("Lakeside".to_string()),
            },
        );
        assert!(view.is_empty());
        // Option domains still reflect the upstream stages.
        assert_eq!(
            view.options.hospitals,
            vec!["Mercy General".to_string(), "St. Elsewhere".to_string()]
        );
    }

    #[test]
    fn test_iter_borrows_shared_storage() {
        let dataset = sample_dataset();
        let view = apply(&dataset, &FilterSelection::all_of(&dataset));
        let hospitals: Vec<&str> = view.iter().map(|r| r.hospital_name.as_str()).collect();
        assert_eq!(
            hospitals,
            vec!["St. Elsewhere", "Mercy General", "Harbor View", "Lakeside"]
        );
    }
}
