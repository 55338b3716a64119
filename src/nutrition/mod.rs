//! Nutrition calculation module
//!
//! Handles nutrient reconciliation and unit conversions.

pub mod converter;
pub mod error;
pub mod nutrients;
pub mod pieces;
pub mod units;

pub use converter::{
    display_value, format_quantity, normalize_zero, step_size, to_grams, DisplayQuantity,
    StepSize,
};
pub use error::{
    ConversionResult, ConversionUnavailable, EditError, EditResult, ValidationError,
    ValidationResult,
};
pub use nutrients::{Nutrient, NutrientPanel, NutrientRatios};
pub use pieces::PiecesReference;
pub use units::{MeasurementUnitConfig, UnitKind, UnitTable, UnitTableSource};
