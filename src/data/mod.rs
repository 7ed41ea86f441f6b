//! Data module - typed records, CSV loading, and the filter pipeline

pub mod filter;
mod loader;
mod record;

pub use filter::{FilterOptions, FilterSelection, FilteredView, OVERALL};
pub use loader::{clear_cache, load_dataset, LoaderError};
pub use record::{Dataset, OutcomeRecord, StatewideComparison, YearSpan};

#[cfg(test)]
pub(crate) use record::blank_record;
