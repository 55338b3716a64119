//! Ingredient edit state
//!
//! One in-progress edit of an ingredient inside a meal. The value is owned by a
//! single edit session and replaced wholesale when the server answers.

use serde::{Deserialize, Serialize};

use crate::nutrition::units::{DEFAULT_DENSITY, GRAM};
use crate::nutrition::{
    converter, ConversionResult, DisplayQuantity, EditResult, NutrientPanel, NutrientRatios,
    PiecesReference, StepSize, UnitTable, ValidationError, ValidationResult,
};

/// An ingredient as returned by the planning service
///
/// Only the fields the edit state cares about; everything is optional since
/// rejection payloads may carry a partial view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub nutrients_map: Option<NutrientRatios>,
    #[serde(default)]
    pub measurement_unit: Option<String>,
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub pcs_weight: Option<f64>,
}

/// Fields sent with an ingredient update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientUpdate {
    pub weight: f64,
    pub ratios: NutrientRatios,
    pub measurement_unit: String,
    pub density: f64,
    /// `None` clears the piece weight on the server
    pub pcs_weight: Option<f64>,
}

/// The edit state of one ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientEditState {
    pub meal_id: String,
    pub ingredient_id: String,
    pub name: Option<String>,
    weight_grams: f64,
    density: f64,
    pieces: PiecesReference,
    selected_unit: String,
    pub nutrients: NutrientPanel,
}

impl IngredientEditState {
    /// A fresh edit: no weight, water density, grams, all water
    pub fn new(meal_id: impl Into<String>, ingredient_id: impl Into<String>) -> Self {
        Self {
            meal_id: meal_id.into(),
            ingredient_id: ingredient_id.into(),
            name: None,
            weight_grams: 0.0,
            density: DEFAULT_DENSITY,
            pieces: PiecesReference::Unset,
            selected_unit: GRAM.to_string(),
            nutrients: NutrientPanel::new(),
        }
    }

    /// Build an edit state from the server's view of an ingredient
    pub fn from_snapshot(
        meal_id: impl Into<String>,
        ingredient_id: impl Into<String>,
        snapshot: &IngredientSnapshot,
    ) -> Self {
        let mut state = Self::new(meal_id, ingredient_id);
        state.apply_snapshot(snapshot);
        state
    }

    /// Take over every field the server reported
    ///
    /// Out-of-range values from the server fall back to defaults instead of
    /// poisoning the edit.
    pub fn apply_snapshot(&mut self, snapshot: &IngredientSnapshot) {
        if let Some(name) = &snapshot.name {
            self.name = Some(name.clone());
        }
        if let Some(weight) = snapshot.weight {
            if weight.is_finite() && weight >= 0.0 {
                self.weight_grams = weight;
            }
        }
        if let Some(ratios) = &snapshot.nutrients_map {
            self.nutrients.apply_server_state(ratios);
        }
        if let Some(unit) = &snapshot.measurement_unit {
            self.selected_unit = unit.trim().to_uppercase();
        }
        if let Some(density) = snapshot.density {
            self.density = if density.is_finite() && density > 0.0 {
                density
            } else {
                DEFAULT_DENSITY
            };
        }
        if snapshot.pcs_weight.is_some() {
            self.pieces = PiecesReference::from_option(snapshot.pcs_weight).unwrap_or_default();
        }
    }

    pub fn weight_grams(&self) -> f64 {
        self.weight_grams
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn pieces(&self) -> PiecesReference {
        self.pieces
    }

    pub fn pcs_weight(&self) -> Option<f64> {
        self.pieces.grams()
    }

    pub fn selected_unit(&self) -> &str {
        &self.selected_unit
    }

    /// Set the canonical weight
    pub fn set_weight(&mut self, grams: f64) -> ValidationResult<()> {
        if !grams.is_finite() || grams < 0.0 {
            return Err(ValidationError::Negative {
                field: "weight",
                value: grams,
            });
        }
        self.weight_grams = grams;
        Ok(())
    }

    /// Set the density in g/ml
    pub fn set_density(&mut self, density: f64) -> ValidationResult<()> {
        if !(density.is_finite() && density > 0.0) {
            return Err(ValidationError::NonPositive {
                field: "density",
                value: density,
            });
        }
        self.density = density;
        Ok(())
    }

    pub fn set_pieces_reference(&mut self, grams: f64) -> ValidationResult<()> {
        self.pieces.set(grams)
    }

    pub fn clear_pieces_reference(&mut self) {
        self.pieces.clear();
    }

    /// Switch the display unit; the weight itself is unchanged
    pub fn select_unit(&mut self, units: &UnitTable, name: &str) -> ValidationResult<()> {
        let unit = units
            .get(name)
            .ok_or_else(|| ValidationError::UnknownUnit(name.to_string()))?;
        self.selected_unit = unit.name.clone();
        Ok(())
    }

    /// Set the weight from a quantity typed in the selected unit
    ///
    /// Returns the resulting weight in grams.
    pub fn set_quantity(&mut self, units: &UnitTable, quantity: f64) -> EditResult<f64> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ValidationError::Negative {
                field: "quantity",
                value: quantity,
            }
            .into());
        }
        let unit = units.require(&self.selected_unit)?;
        let grams = converter::to_grams(quantity, unit, self.density, self.pcs_weight())?;
        self.set_weight(grams)?;
        Ok(grams)
    }

    /// Current weight expressed in the selected unit
    pub fn display(&self, units: &UnitTable) -> ConversionResult<DisplayQuantity> {
        let unit = units.require(&self.selected_unit)?;
        converter::display_value(self.weight_grams, unit, self.density, self.pcs_weight())
    }

    /// Input step for the selected unit
    pub fn step(&self, units: &UnitTable) -> ConversionResult<StepSize> {
        let unit = units.require(&self.selected_unit)?;
        converter::step_size(unit, self.density, self.pcs_weight())
    }

    /// Energy density in kcal per kilogram
    pub fn energy_density(&self) -> f64 {
        self.nutrients.energy_density()
    }

    /// Validate and package the edit for the planning service
    pub fn to_update(&self) -> ValidationResult<IngredientUpdate> {
        self.nutrients.validate_for_submit()?;
        Ok(IngredientUpdate {
            weight: self.weight_grams,
            ratios: self.nutrients.to_ratios(),
            measurement_unit: self.selected_unit.clone(),
            density: self.density,
            pcs_weight: self.pcs_weight(),
        })
    }
}
