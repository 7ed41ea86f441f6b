//! Fixed color policy for the dashboard.
//! Cyan-family theme; a decrease in mortality (or a rate below expectation)
//! is the favorable direction.

use crate::data::StatewideComparison;
use egui::Color32;

/// Dark turquoise - main data, "as expected" outcomes.
pub const PRIMARY: Color32 = Color32::from_rgb(0, 206, 209);
/// Medium turquoise - favorable outcomes.
pub const ACCENT_POSITIVE: Color32 = Color32::from_rgb(72, 209, 204);
/// Coral - unfavorable outcomes.
pub const ACCENT_NEGATIVE: Color32 = Color32::from_rgb(239, 83, 80);
/// Light sea green - additional series.
pub const SECONDARY_ACCENT: Color32 = Color32::from_rgb(32, 178, 170);
pub const NEUTRAL_DARK: Color32 = Color32::from_rgb(51, 51, 51);

/// Fallback cycle for procedures outside the fixed map.
const EXTENDED: [Color32; 4] = [
    Color32::from_rgb(0, 188, 212),
    Color32::from_rgb(38, 166, 154),
    Color32::from_rgb(77, 182, 172),
    Color32::from_rgb(96, 125, 139),
];

pub fn comparison_color(comparison: Option<StatewideComparison>) -> Color32 {
    match comparison {
        Some(StatewideComparison::Higher) => ACCENT_NEGATIVE,
        Some(StatewideComparison::Lower) => ACCENT_POSITIVE,
        Some(StatewideComparison::NotDifferent) => PRIMARY,
        None => Color32::GRAY,
    }
}

pub fn procedure_color(procedure: &str, fallback_index: usize) -> Color32 {
    match procedure {
        "All PCI" => PRIMARY,
        "Non-Emergency PCI" => ACCENT_POSITIVE,
        "Valve or Valve/CABG" => SECONDARY_ACCENT,
        _ => EXTENDED[fallback_index % EXTENDED.len()],
    }
}

/// Directional KPI coloring: negative difference/decrease is favorable.
pub fn direction_color(value: f64) -> Color32 {
    if value < 0.0 {
        ACCENT_POSITIVE
    } else if value > 0.0 {
        ACCENT_NEGATIVE
    } else {
        PRIMARY
    }
}

/// Diverging fill keyed to the sign and magnitude of a difference metric,
/// fading from the neutral primary out to the directional accents.
pub fn diverging_color(value: f64, max_magnitude: f64) -> Color32 {
    if max_magnitude <= 0.0 {
        return PRIMARY;
    }
    let t = (value / max_magnitude).clamp(-1.0, 1.0);
    if t >= 0.0 {
        lerp(PRIMARY, ACCENT_NEGATIVE, t as f32)
    } else {
        lerp(PRIMARY, ACCENT_POSITIVE, -t as f32)
    }
}

fn lerp(from: Color32, to: Color32, t: f32) -> Color32 {
    let channel = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    Color32::from_rgb(
        channel(from.r(), to.r()),
        channel(from.g(), to.g()),
        channel(from.b(), to.b()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_color_favors_decreases() {
        assert_eq!(direction_color(-0.5), ACCENT_POSITIVE);
        assert_eq!(direction_color(0.5), ACCENT_NEGATIVE);
        assert_eq!(direction_color(0.0), PRIMARY);
    }

    #[test]
    fn test_diverging_color_saturates_at_the_accents() {
        assert_eq!(diverging_color(2.0, 1.0), ACCENT_NEGATIVE);
        assert_eq!(diverging_color(-2.0, 1.0), ACCENT_POSITIVE);
        assert_eq!(diverging_color(0.0, 1.0), PRIMARY);
        // Degenerate magnitude falls back to neutral.
        assert_eq!(diverging_color(1.0, 0.0), PRIMARY);
    }
}
