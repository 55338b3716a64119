//! Measurement unit configuration
//!
//! Unit definitions come from the planning service once at startup. When that
//! fetch fails a minimal built-in table keeps conversions usable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{ConversionResult, ConversionUnavailable};

/// Name of the canonical unit every weight is stored in
pub const GRAM: &str = "GRAM";
/// Name of the piece-count unit
pub const PCS: &str = "PCS";
/// Name of the built-in kilogram unit
pub const KILOGRAM: &str = "KILOGRAM";

/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;

/// Default density (g/ml) when an ingredient has none recorded: water
pub const DEFAULT_DENSITY: f64 = 1.0;

/// One measurement unit as served by `/configuration/measurement-units`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementUnitConfig {
    pub name: String,
    /// Grams (or ml for volume units) in one unit; absent only for `PCS`
    pub standard_grams: Option<f64>,
    #[serde(default)]
    pub is_volume: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How a unit relates to canonical grams
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitKind {
    /// The gram itself
    Canonical,
    /// Fixed grams per unit
    Mass { grams_per_unit: f64 },
    /// Milliliters per unit, needs a density
    Volume { ml_per_unit: f64 },
    /// Counted pieces, needs a per-piece weight
    Pieces,
}

impl MeasurementUnitConfig {
    pub fn new(name: &str, standard_grams: Option<f64>, is_volume: bool, description: &str) -> Self {
        Self {
            name: name.to_string(),
            standard_grams,
            is_volume,
            description: Some(description.to_string()),
        }
    }

    /// Classify this unit
    pub fn kind(&self) -> ConversionResult<UnitKind> {
        if self.name.eq_ignore_ascii_case(GRAM) {
            return Ok(UnitKind::Canonical);
        }
        if self.name.eq_ignore_ascii_case(PCS) {
            return Ok(UnitKind::Pieces);
        }

        let standard = self
            .standard_grams
            .filter(|g| g.is_finite() && *g > 0.0)
            .ok_or_else(|| ConversionUnavailable::MissingStandardGrams(self.name.clone()))?;

        if self.is_volume {
            Ok(UnitKind::Volume { ml_per_unit: standard })
        } else {
            Ok(UnitKind::Mass { grams_per_unit: standard })
        }
    }
}

/// Where a unit table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitTableSource {
    Remote,
    Builtin,
}

/// Read-only lookup of unit configurations, keyed by upper-case name
#[derive(Debug, Clone)]
pub struct UnitTable {
    units: Vec<MeasurementUnitConfig>,
    index: HashMap<String, usize>,
    source: UnitTableSource,
}

impl UnitTable {
    /// Build a table from fetched configurations
    ///
    /// Later duplicates of a name are dropped. The gram and piece units are
    /// always present since every edit state can fall back to them.
    pub fn from_configs(configs: Vec<MeasurementUnitConfig>, source: UnitTableSource) -> Self {
        let mut table = Self {
            units: Vec::with_capacity(configs.len()),
            index: HashMap::new(),
            source,
        };

        for config in configs {
            table.insert(config);
        }
        for config in Self::builtin_configs() {
            if !table.contains(&config.name) {
                table.insert(config);
            }
        }

        table
    }

    /// The degraded table used when the service is unreachable
    pub fn builtin() -> Self {
        Self::from_configs(Self::builtin_configs(), UnitTableSource::Builtin)
    }

    fn builtin_configs() -> Vec<MeasurementUnitConfig> {
        vec![
            MeasurementUnitConfig::new(GRAM, Some(1.0), false, "Metric weight"),
            MeasurementUnitConfig::new(PCS, None, false, "Custom piece weight"),
            MeasurementUnitConfig::new(KILOGRAM, Some(G_PER_KG), false, "Metric weight"),
        ]
    }

    fn insert(&mut self, config: MeasurementUnitConfig) {
        let key = config.name.trim().to_uppercase();
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.units.len());
        self.units.push(config);
    }

    /// Look up a unit by name, case-insensitively
    pub fn get(&self, name: &str) -> Option<&MeasurementUnitConfig> {
        self.index
            .get(&name.trim().to_uppercase())
            .map(|i| &self.units[*i])
    }

    /// Look up a unit, reporting a missing one as an unavailable conversion
    pub fn require(&self, name: &str) -> ConversionResult<&MeasurementUnitConfig> {
        self.get(name)
            .ok_or_else(|| ConversionUnavailable::UnknownUnit(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Units in the order they were received
    pub fn units(&self) -> &[MeasurementUnitConfig] {
        &self.units
    }

    pub fn source(&self) -> UnitTableSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::builtin()
    }
}
