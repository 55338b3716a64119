//! Validation and conversion error types
//!
//! Both kinds are local and recoverable: callers surface them as a status next
//! to the last good value instead of aborting the edit.

use thiserror::Error;

use super::nutrients::Nutrient;

/// Input rejected before it reaches the edit state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{nutrient} must be between 0 and 100 percent, got {value}")]
    OutOfRange { nutrient: Nutrient, value: f64 },

    #[error("{nutrient} is outside 0-100 percent ({value}); fix it before submitting")]
    RangeViolation { nutrient: Nutrient, value: f64 },

    #[error("{field} must be greater than 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("Unknown nutrient: {0}")]
    UnknownNutrient(String),

    #[error("Water is derived from the other nutrients and cannot be set directly")]
    WaterNotEditable,

    #[error("Unknown measurement unit: {0}")]
    UnknownUnit(String),
}

/// Why a display conversion could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionUnavailable {
    #[error("no piece weight set")]
    MissingPiecesReference,

    #[error("density must be greater than 0 for volume units")]
    NonPositiveDensity,

    #[error("unit {0} has no standard gram weight")]
    MissingStandardGrams(String),

    #[error("unit {0} is not configured")]
    UnknownUnit(String),
}

/// Result type for validated edits
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for unit conversions
pub type ConversionResult<T> = Result<T, ConversionUnavailable>;

/// Either failure an edit can hit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("conversion unavailable: {0}")]
    Conversion(#[from] ConversionUnavailable),
}

/// Result type for edits that may validate and convert
pub type EditResult<T> = Result<T, EditError>;
