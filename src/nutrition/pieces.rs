//! Per-piece weight anchor for the `PCS` unit

use serde::{Deserialize, Serialize};

use super::error::{ValidationError, ValidationResult};

/// Grams-per-piece reference, either unset or a positive weight
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "grams", rename_all = "lowercase")]
pub enum PiecesReference {
    #[default]
    Unset,
    Set(f64),
}

impl PiecesReference {
    /// Build from an optional weight as reported by the planning service
    pub fn from_option(grams: Option<f64>) -> ValidationResult<Self> {
        let mut reference = Self::Unset;
        if let Some(g) = grams {
            reference.set(g)?;
        }
        Ok(reference)
    }

    /// Anchor to `grams` per piece; setting the same weight again is a no-op
    pub fn set(&mut self, grams: f64) -> ValidationResult<()> {
        if !(grams.is_finite() && grams > 0.0) {
            return Err(ValidationError::NonPositive {
                field: "pieces reference",
                value: grams,
            });
        }
        *self = Self::Set(grams);
        Ok(())
    }

    /// Drop the anchor; already unset is a no-op
    pub fn clear(&mut self) {
        *self = Self::Unset;
    }

    pub fn grams(&self) -> Option<f64> {
        match self {
            Self::Unset => None,
            Self::Set(g) => Some(*g),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut r = PiecesReference::default();
        assert!(!r.is_set());

        r.set(40.0).unwrap();
        assert_eq!(r.grams(), Some(40.0));
        r.set(40.0).unwrap();
        assert_eq!(r, PiecesReference::Set(40.0));

        r.clear();
        assert_eq!(r, PiecesReference::Unset);
        r.clear();
        assert_eq!(r.grams(), None);
    }

    #[test]
    fn test_set_rejects_non_positive() {
        let mut r = PiecesReference::Set(12.0);
        assert!(matches!(r.set(0.0), Err(ValidationError::NonPositive { .. })));
        assert!(matches!(r.set(-3.0), Err(ValidationError::NonPositive { .. })));
        assert!(r.set(f64::NAN).is_err());
        assert_eq!(r.grams(), Some(12.0));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(PiecesReference::from_option(None), Ok(PiecesReference::Unset));
        assert_eq!(
            PiecesReference::from_option(Some(55.0)),
            Ok(PiecesReference::Set(55.0))
        );
        assert!(PiecesReference::from_option(Some(0.0)).is_err());
    }
}
