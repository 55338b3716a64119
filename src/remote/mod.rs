//! Remote planning service
//!
//! The service owns adventures, meals and all aggregation. This crate only
//! needs two calls: the unit table at startup and the ingredient update.

pub mod client;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{IngredientSnapshot, IngredientUpdate};
use crate::nutrition::{MeasurementUnitConfig, NutrientRatios, UnitTable, UnitTableSource};

pub use client::HttpPlanningClient;

/// Planning service error types
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Update rejected: {message}")]
    Rejected {
        message: String,
        /// The ingredient's last valid nutrients, when the service sent them
        snapshot: Option<NutrientRatios>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for planning service calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Body of a non-2xx answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectionBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "currentNutrients", alias = "currentNutrientRatios")]
    nutrients_map: Option<NutrientRatios>,
}

/// Turn a failed response into a rejection
///
/// JSON bodies contribute their message and snapshot; anything else is used
/// verbatim as the message.
pub fn rejection_from_response(status: u16, body: &str) -> RemoteError {
    let (message, snapshot) = match serde_json::from_str::<RejectionBody>(body) {
        Ok(parsed) => (parsed.message, parsed.nutrients_map),
        Err(_) => {
            let text = body.trim();
            ((!text.is_empty()).then(|| text.to_string()), None)
        }
    };

    RemoteError::Rejected {
        message: message.unwrap_or_else(|| format!("Request failed with status {}", status)),
        snapshot,
    }
}

/// Calls the edit flow makes against the planning service
#[async_trait]
pub trait PlanningService: Send + Sync {
    /// `GET /configuration/measurement-units`
    async fn measurement_units(&self) -> RemoteResult<Vec<MeasurementUnitConfig>>;

    /// `PUT /meals/{meal_id}/ingredients/{ingredient_id}`
    async fn update_ingredient(
        &self,
        meal_id: &str,
        ingredient_id: &str,
        update: &IngredientUpdate,
    ) -> RemoteResult<IngredientSnapshot>;
}

/// Load the unit table, falling back to the built-in one on any failure
pub async fn load_unit_table(service: &dyn PlanningService) -> UnitTable {
    match service.measurement_units().await {
        Ok(configs) if !configs.is_empty() => {
            tracing::info!("Loaded {} measurement units from planning service", configs.len());
            UnitTable::from_configs(configs, UnitTableSource::Remote)
        }
        Ok(_) => {
            tracing::warn!("Planning service returned no measurement units, using built-in table");
            UnitTable::builtin()
        }
        Err(e) => {
            tracing::warn!("Could not load measurement units ({}), using built-in table", e);
            UnitTable::builtin()
        }
    }
}
