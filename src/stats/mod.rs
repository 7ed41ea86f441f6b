//! Stats module - summary aggregation over filtered views

mod calculator;

pub use calculator::{
    ComparisonMixRow, DashboardSummary, DifferenceTrendPoint, HospitalCiWidthRow,
    HospitalRankingRow, HospitalScatterPoint, KpiSummary, MortalityTrendPoint, ProcedureCiRow,
    ProcedureMortalityRow, ProcedureVolumeRow, RegionDifferenceRow, SummaryCalculator,
    SummaryError, VolumeTrendPoint, RANKING_DEPTH,
};
