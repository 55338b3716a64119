//! Nutrient reconciliation
//!
//! Keeps the six macro-nutrient shares of one ingredient coherent while five of
//! them are edited independently. Water is always the derived remainder.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ValidationError, ValidationResult};

/// Slack allowed when comparing percentage sums
pub const PERCENT_TOLERANCE: f64 = 1e-9;

/// kcal per kilogram of pure carbohydrate or protein
pub const KCAL_PER_KG_CARBS_PROTEIN: f64 = 4000.0;
/// kcal per kilogram of pure fat
pub const KCAL_PER_KG_FAT: f64 = 9000.0;

/// A tracked nutrient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Protein,
    Fat,
    Carbs,
    Water,
    Fiber,
    Salt,
}

impl Nutrient {
    /// All nutrients, in the order the planning service reports them
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbs,
        Nutrient::Water,
        Nutrient::Fiber,
        Nutrient::Salt,
    ];

    /// Nutrients a user may author directly
    pub const EDITABLE: [Nutrient; 5] = [
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbs,
        Nutrient::Fiber,
        Nutrient::Salt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::Carbs => "carbs",
            Nutrient::Water => "water",
            Nutrient::Fiber => "fiber",
            Nutrient::Salt => "salt",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "protein" => Some(Nutrient::Protein),
            "fat" => Some(Nutrient::Fat),
            "carbs" | "carbohydrates" => Some(Nutrient::Carbs),
            "water" => Some(Nutrient::Water),
            "fiber" | "fibre" => Some(Nutrient::Fiber),
            "salt" => Some(Nutrient::Salt),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, Nutrient::Water)
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mass fractions in [0, 1], the shape exchanged with the planning service
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientRatios {
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub water: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub salt: f64,
}

impl NutrientRatios {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbs => self.carbs,
            Nutrient::Water => self.water,
            Nutrient::Fiber => self.fiber,
            Nutrient::Salt => self.salt,
        }
    }

    /// Sum of all six ratios
    pub fn sum(&self) -> f64 {
        Nutrient::ALL.iter().map(|n| self.get(*n)).sum()
    }

    /// Energy density in kcal per kilogram
    pub fn energy_density(&self) -> f64 {
        (self.carbs + self.protein) * KCAL_PER_KG_CARBS_PROTEIN + self.fat * KCAL_PER_KG_FAT
    }
}

/// Percentage state of one ingredient's nutrients
///
/// The five editable values are only ever written through [`NutrientPanel::set_nutrient`]
/// or replaced wholesale from a server snapshot; water follows along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientPanel {
    protein: f64,
    fat: f64,
    carbs: f64,
    water: f64,
    fiber: f64,
    salt: f64,
}

impl Default for NutrientPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl NutrientPanel {
    /// An ingredient with no solids recorded yet: all water
    pub fn new() -> Self {
        Self {
            protein: 0.0,
            fat: 0.0,
            carbs: 0.0,
            water: 100.0,
            fiber: 0.0,
            salt: 0.0,
        }
    }

    /// Current percentage for a nutrient
    pub fn percent(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbs => self.carbs,
            Nutrient::Water => self.water,
            Nutrient::Fiber => self.fiber,
            Nutrient::Salt => self.salt,
        }
    }

    fn slot(&mut self, nutrient: Nutrient) -> &mut f64 {
        match nutrient {
            Nutrient::Protein => &mut self.protein,
            Nutrient::Fat => &mut self.fat,
            Nutrient::Carbs => &mut self.carbs,
            Nutrient::Water => &mut self.water,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Salt => &mut self.salt,
        }
    }

    /// Set one editable nutrient and re-derive water
    pub fn set_nutrient(&mut self, nutrient: Nutrient, percent: f64) -> ValidationResult<()> {
        if !nutrient.is_editable() {
            return Err(ValidationError::WaterNotEditable);
        }
        if !(0.0..=100.0).contains(&percent) {
            return Err(ValidationError::OutOfRange { nutrient, value: percent });
        }

        *self.slot(nutrient) = percent;
        self.water = self.recompute_water();
        Ok(())
    }

    /// Same as [`NutrientPanel::set_nutrient`], keyed by name
    pub fn set_nutrient_by_name(&mut self, name: &str, percent: f64) -> ValidationResult<()> {
        let nutrient = Nutrient::from_str(name)
            .ok_or_else(|| ValidationError::UnknownNutrient(name.to_string()))?;
        self.set_nutrient(nutrient, percent)
    }

    /// Sum of the five editable percentages
    pub fn editable_sum(&self) -> f64 {
        Nutrient::EDITABLE.iter().map(|n| self.percent(*n)).sum()
    }

    /// Water share implied by the editable values
    ///
    /// Floors at 0 when the others exceed 100; the others are left untouched.
    pub fn recompute_water(&self) -> f64 {
        (100.0 - self.editable_sum()).clamp(0.0, 100.0)
    }

    /// Sum of all six percentages
    pub fn total_percent(&self) -> f64 {
        Nutrient::ALL.iter().map(|n| self.percent(*n)).sum()
    }

    /// True when the editable values alone exceed 100 percent
    pub fn is_overfull(&self) -> bool {
        self.editable_sum() > 100.0 + PERCENT_TOLERANCE
    }

    /// Convert the six percentages to ratios for transmission
    pub fn to_ratios(&self) -> NutrientRatios {
        NutrientRatios {
            protein: self.protein / 100.0,
            fat: self.fat / 100.0,
            carbs: self.carbs / 100.0,
            water: self.water / 100.0,
            fiber: self.fiber / 100.0,
            salt: self.salt / 100.0,
        }
    }

    /// Build a panel from an authoritative ratio snapshot
    ///
    /// Only the five editable values are taken over; water is derived from
    /// them, whatever the snapshot says about it.
    pub fn from_ratios(ratios: &NutrientRatios) -> Self {
        let pct = |v: f64| {
            if v.is_finite() {
                (v * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            }
        };

        let mut panel = Self {
            protein: pct(ratios.protein),
            fat: pct(ratios.fat),
            carbs: pct(ratios.carbs),
            water: 0.0,
            fiber: pct(ratios.fiber),
            salt: pct(ratios.salt),
        };
        panel.water = panel.recompute_water();
        panel
    }

    /// Replace all six values with the server's view
    pub fn apply_server_state(&mut self, ratios: &NutrientRatios) {
        *self = Self::from_ratios(ratios);
    }

    /// Range check run before a submit
    ///
    /// Sums above 100 are left for the planning service to judge.
    pub fn validate_for_submit(&self) -> ValidationResult<()> {
        for nutrient in Nutrient::EDITABLE {
            let value = self.percent(nutrient);
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::RangeViolation { nutrient, value });
            }
        }
        Ok(())
    }

    /// Energy density in kcal per kilogram
    pub fn energy_density(&self) -> f64 {
        self.to_ratios().energy_density()
    }

    /// (nutrient, percent) pairs in service order
    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.iter().map(move |n| (*n, self.percent(*n)))
    }
}
