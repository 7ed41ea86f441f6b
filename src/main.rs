//! CardioScope - Cardiac Care Performance Dashboard
//!
//! Interactive analytics over hospital cardiac-procedure outcomes: cascading
//! filters over a static CSV export, derived KPIs, and chart views.

mod charts;
mod data;
mod gui;
mod stats;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use gui::CardioscopeApp;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardioscope", version, about = "Cardiac care performance dashboard")]
struct Args {
    /// Path to the cardiac outcomes CSV export.
    #[arg(
        value_name = "CSV",
        env = "CARDIOSCOPE_DATA",
        default_value = "cardiac_data_cleaned_engineered.csv"
    )]
    data: PathBuf,

    /// Print the full-dataset summary as JSON and exit without opening a
    /// window.
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if args.summary {
        return print_summary(&args.data);
    }

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("CardioScope"),
        ..Default::default()
    };

    let data_path = args.data;
    eframe::run_native(
        "CardioScope",
        options,
        Box::new(move |cc| Ok(Box::new(CardioscopeApp::new(cc, data_path)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the dashboard: {e}"))
}

/// Headless mode: full-domain filter, summary as JSON on stdout.
fn print_summary(path: &Path) -> anyhow::Result<()> {
    let dataset = data::load_dataset(path).context("loading dataset")?;
    let selection = data::FilterSelection::all_of(&dataset);
    let view = data::filter::apply(&dataset, &selection);
    let summary = stats::SummaryCalculator::compute(&view).context("summarizing dataset")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
