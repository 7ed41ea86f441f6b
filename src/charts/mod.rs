//! Charts module - color policy and chart rendering

pub mod palette;
mod plotter;

pub use plotter::ChartPlotter;
