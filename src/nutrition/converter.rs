//! Unit conversion functions
//!
//! Presents a canonical gram weight in the unit a user picked, converts typed
//! quantities back to grams, and picks the increment a numeric input snaps to.

use serde::Serialize;

use super::error::{ConversionResult, ConversionUnavailable};
use super::units::{MeasurementUnitConfig, UnitKind};

/// Display values closer to zero than this are shown as exactly zero
pub const ZERO_TOLERANCE: f64 = 1e-3;

/// Smallest step an input is allowed to snap to, in grams
pub const MIN_STEP: f64 = 0.001;

/// A weight expressed in a display unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayQuantity {
    pub value: f64,
    /// True for the canonical unit, whose value is the weight itself
    pub hidden: bool,
}

/// Increment for a numeric weight input, in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepSize {
    pub grams: f64,
    /// Set when the step fell back because a reference value was missing
    pub degraded: bool,
}

/// Squash float noise around zero
pub fn normalize_zero(value: f64) -> f64 {
    if value.abs() < ZERO_TOLERANCE {
        0.0
    } else {
        value
    }
}

fn valid_density(density: f64) -> ConversionResult<f64> {
    if density.is_finite() && density > 0.0 {
        Ok(density)
    } else {
        Err(ConversionUnavailable::NonPositiveDensity)
    }
}

fn valid_piece_weight(pcs_weight: Option<f64>) -> ConversionResult<f64> {
    pcs_weight
        .filter(|g| g.is_finite() && *g > 0.0)
        .ok_or(ConversionUnavailable::MissingPiecesReference)
}

/// Convert a canonical weight into `unit`
///
/// Examples:
/// - 250 g as TEASPOON (5 ml) at density 1.0 -> 50
/// - 200 g as PCS with 40 g per piece -> 5
/// - 250 g as KILOGRAM -> 0.25
pub fn display_value(
    weight_grams: f64,
    unit: &MeasurementUnitConfig,
    density: f64,
    pcs_weight: Option<f64>,
) -> ConversionResult<DisplayQuantity> {
    let value = match unit.kind()? {
        UnitKind::Canonical => {
            return Ok(DisplayQuantity {
                value: weight_grams,
                hidden: true,
            })
        }
        UnitKind::Pieces => weight_grams / valid_piece_weight(pcs_weight)?,
        UnitKind::Mass { grams_per_unit } => weight_grams / grams_per_unit,
        UnitKind::Volume { ml_per_unit } => {
            let ml = weight_grams / valid_density(density)?;
            ml / ml_per_unit
        }
    };

    Ok(DisplayQuantity {
        value: normalize_zero(value),
        hidden: false,
    })
}

/// Convert a quantity typed in `unit` back to canonical grams
pub fn to_grams(
    quantity: f64,
    unit: &MeasurementUnitConfig,
    density: f64,
    pcs_weight: Option<f64>,
) -> ConversionResult<f64> {
    let grams = match unit.kind()? {
        UnitKind::Canonical => quantity,
        UnitKind::Pieces => quantity * valid_piece_weight(pcs_weight)?,
        UnitKind::Mass { grams_per_unit } => quantity * grams_per_unit,
        UnitKind::Volume { ml_per_unit } => quantity * ml_per_unit * valid_density(density)?,
    };
    Ok(normalize_zero(grams))
}

/// Grams one step of a numeric input in `unit` should move
pub fn step_size(
    unit: &MeasurementUnitConfig,
    density: f64,
    pcs_weight: Option<f64>,
) -> ConversionResult<StepSize> {
    let (grams, degraded) = match unit.kind()? {
        UnitKind::Canonical => (1.0, false),
        UnitKind::Pieces => match valid_piece_weight(pcs_weight) {
            Ok(g) => (g, false),
            Err(_) => {
                tracing::debug!("No piece weight for {}, stepping by 1 g", unit.name);
                (1.0, true)
            }
        },
        UnitKind::Mass { grams_per_unit } => (grams_per_unit, false),
        UnitKind::Volume { ml_per_unit } => match valid_density(density) {
            Ok(d) => (ml_per_unit * d, false),
            Err(_) => (MIN_STEP, true),
        },
    };

    Ok(StepSize {
        grams: grams.max(MIN_STEP),
        degraded,
    })
}

/// Render a quantity with at most three decimals and no trailing zeros
pub fn format_quantity(value: f64) -> String {
    let rendered = format!("{:.3}", normalize_zero(value));
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
