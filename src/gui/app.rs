//! CardioScope Main Application
//! Main window wiring the sidebar filters to the dashboard. Dataset loading
//! and summary recomputation run on background threads and report back over
//! channels polled each frame.

use crate::data::{self, Dataset, FilterOptions, FilterSelection};
use crate::gui::{ControlPanel, ControlPanelAction, DashboardView};
use crate::stats::{DashboardSummary, SummaryCalculator, SummaryError};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// Dataset loading result from the background thread.
enum LoadResult {
    Complete(Dataset),
    Error(String),
}

/// Filter + summary result from the background thread.
enum CalcResult {
    Complete {
        options: FilterOptions,
        row_count: usize,
        summary: Box<DashboardSummary>,
    },
    Empty {
        options: FilterOptions,
    },
}

/// Main application window.
pub struct CardioscopeApp {
    dataset: Option<Dataset>,
    control_panel: ControlPanel,
    dashboard: DashboardView,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    calc_rx: Option<Receiver<CalcResult>>,
    is_calculating: bool,
    // A filter change that arrived while a recompute was still running.
    pending_recompute: bool,
}

impl CardioscopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, data_path: PathBuf) -> Self {
        let mut app = Self {
            dataset: None,
            control_panel: ControlPanel::new(),
            dashboard: DashboardView::new(),
            load_rx: None,
            is_loading: false,
            calc_rx: None,
            is_calculating: false,
            pending_recompute: false,
        };
        app.start_load(data_path);
        app
    }

    /// Load (or reload) a dataset on a background thread.
    fn start_load(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }
        self.dashboard.clear();
        self.control_panel.data_path = Some(path.clone());
        self.control_panel.set_status("Loading dataset...");
        self.control_panel.selection = None;
        self.control_panel.options = FilterOptions::default();
        self.control_panel.row_count = 0;
        self.dataset = None;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || match data::load_dataset(&path) {
            Ok(dataset) => {
                let _ = tx.send(LoadResult::Complete(dataset));
            }
            Err(e) => {
                tracing::error!(error = %e, "dataset load failed");
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        });
    }

    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Complete(dataset) => {
                        self.control_panel
                            .set_status(&format!("Loaded {} rows", dataset.len()));
                        self.control_panel.selection = Some(FilterSelection::all_of(&dataset));
                        self.dataset = Some(dataset);
                        self.is_loading = false;
                        should_keep_receiver = false;
                        self.start_recompute();
                    }
                    LoadResult::Error(error) => {
                        self.control_panel.set_status(&format!("Error: {error}"));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Re-run the filter pipeline and the summary on a background thread.
    fn start_recompute(&mut self) {
        if self.is_calculating {
            self.pending_recompute = true;
            return;
        }
        let (Some(dataset), Some(selection)) = (
            self.dataset.clone(),
            self.control_panel.selection.clone(),
        ) else {
            return;
        };

        self.is_calculating = true;
        let (tx, rx) = channel();
        self.calc_rx = Some(rx);

        thread::spawn(move || {
            let view = data::filter::apply(&dataset, &selection);
            let options = view.options.clone();
            match SummaryCalculator::compute(&view) {
                Ok(summary) => {
                    let _ = tx.send(CalcResult::Complete {
                        options,
                        row_count: view.len(),
                        summary: Box::new(summary),
                    });
                }
                Err(SummaryError::EmptySelection) => {
                    let _ = tx.send(CalcResult::Empty { options });
                }
            }
        });
    }

    fn check_calc_results(&mut self) {
        let rx = self.calc_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    CalcResult::Complete {
                        options,
                        row_count,
                        summary,
                    } => {
                        self.control_panel.options = options;
                        self.control_panel.row_count = row_count;
                        self.control_panel
                            .set_status(&format!("Showing {row_count} rows"));
                        self.dashboard.set_summary(*summary);
                        self.is_calculating = false;
                        should_keep_receiver = false;
                    }
                    CalcResult::Empty { options } => {
                        self.control_panel.options = options;
                        self.control_panel.row_count = 0;
                        self.control_panel
                            .set_status("No data for the selected filters");
                        self.dashboard.show_empty_warning();
                        self.is_calculating = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.calc_rx = Some(rx);
            } else if self.pending_recompute {
                self.pending_recompute = false;
                self.start_recompute();
            }
        }
    }

    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_load(path);
        }
    }
}

impl eframe::App for CardioscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_calc_results();

        // Request repaint while work is in flight
        if self.is_loading || self.is_calculating {
            ctx.request_repaint();
        }

        // Left panel - filters
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::FiltersChanged => self.start_recompute(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.dashboard.show(ui);
        });
    }
}
