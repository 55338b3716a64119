//! Ingredient editing tools
//!
//! An [`EditSession`] owns the single ingredient being edited, remembers the
//! last state the planning service confirmed, and drives the submit flow.
//! Local validation and conversion problems never abort the session: they are
//! reported in `status` while the previous values stay in place.

use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::models::{IngredientEditState, IngredientSnapshot};
use crate::nutrition::{
    format_quantity, Nutrient, NutrientRatios, UnitTable, ValidationError,
};
use crate::remote::{PlanningService, RemoteError};

/// Shown in place of a quantity that cannot be converted
pub const UNAVAILABLE: &str = "unavailable";

/// Why a submit did not go through
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// One row of the nutrient panel
#[derive(Debug, Serialize)]
pub struct NutrientLine {
    pub nutrient: Nutrient,
    pub percent: f64,
    /// Water is computed, not typed
    pub derived: bool,
}

/// Everything a front end needs to render the edit
#[derive(Debug, Serialize)]
pub struct IngredientView {
    pub meal_id: String,
    pub ingredient_id: String,
    pub name: Option<String>,
    pub weight_grams: f64,
    pub unit: String,
    /// Weight in `unit`, absent when it cannot be converted
    pub quantity: Option<f64>,
    pub quantity_display: String,
    pub conversion_hidden: bool,
    pub conversion_status: Option<String>,
    pub step_grams: Option<f64>,
    pub step_degraded: bool,
    pub density: f64,
    pub pcs_weight: Option<f64>,
    pub nutrients: Vec<NutrientLine>,
    pub total_percent: f64,
    pub energy_density_kcal_per_kg: f64,
    pub warnings: Vec<String>,
    pub status: Option<String>,
    pub unsaved_changes: bool,
}

/// The ingredient currently being edited
#[derive(Debug, Clone)]
pub struct EditSession {
    state: IngredientEditState,
    last_good: IngredientEditState,
    status: Option<String>,
}

impl EditSession {
    /// Start editing; the opening state counts as confirmed
    pub fn open(state: IngredientEditState) -> Self {
        Self {
            last_good: state.clone(),
            state,
            status: None,
        }
    }

    pub fn state(&self) -> &IngredientEditState {
        &self.state
    }

    pub fn last_good(&self) -> &IngredientEditState {
        &self.last_good
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state != self.last_good
    }

    /// Apply an edit to a copy of the state and keep it only if it succeeds
    pub fn edit<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut IngredientEditState) -> Result<T, E>,
        E: Display,
    {
        let mut next = self.state.clone();
        match f(&mut next) {
            Ok(value) => {
                self.state = next;
                self.status = None;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("Edit of {} rejected: {}", self.state.ingredient_id, e);
                self.status = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Throw away local edits
    pub fn reset_to_last_good(&mut self) {
        tracing::info!("Resetting {} to last confirmed state", self.state.ingredient_id);
        self.state = self.last_good.clone();
        self.status = Some("Reset to last saved values".to_string());
    }

    /// Send the edit to the planning service and take over its answer
    ///
    /// On rejection the edit snaps back to the last confirmed state, with the
    /// service's nutrient snapshot applied when it sent one.
    pub async fn submit(&mut self, service: &dyn PlanningService) -> Result<(), SubmitError> {
        let update = match self.state.to_update() {
            Ok(update) => update,
            Err(e) => {
                self.status = Some(e.to_string());
                return Err(e.into());
            }
        };

        if self.state.nutrients.is_overfull() {
            tracing::warn!(
                "Submitting {} with nutrients at {:.1}% before water",
                self.state.ingredient_id,
                self.state.nutrients.editable_sum()
            );
        }

        let result = service
            .update_ingredient(&self.state.meal_id, &self.state.ingredient_id, &update)
            .await;

        match result {
            Ok(snapshot) => {
                self.state.apply_snapshot(&snapshot);
                self.last_good = self.state.clone();
                self.status = Some("Saved".to_string());
                tracing::info!(
                    "Updated ingredient {} in meal {} ({} g)",
                    self.state.ingredient_id,
                    self.state.meal_id,
                    self.state.weight_grams()
                );
                Ok(())
            }
            Err(RemoteError::Rejected { message, snapshot }) => {
                tracing::warn!(
                    "Planning service rejected update of {}: {}",
                    self.state.ingredient_id,
                    message
                );
                self.state = self.last_good.clone();
                if let Some(ratios) = &snapshot {
                    self.state.nutrients.apply_server_state(ratios);
                    self.last_good = self.state.clone();
                }
                self.status = Some(message.clone());
                Err(RemoteError::Rejected { message, snapshot }.into())
            }
            Err(e) => {
                tracing::warn!("Update of {} failed: {}", self.state.ingredient_id, e);
                self.status = Some(format!("Could not reach planning service: {}", e));
                Err(e.into())
            }
        }
    }

    /// Render the current state
    pub fn view(&self, units: &UnitTable) -> IngredientView {
        let state = &self.state;
        let mut warnings = Vec::new();

        let (quantity, quantity_display, conversion_hidden, conversion_status) =
            match state.display(units) {
                Ok(d) => (Some(d.value), format_quantity(d.value), d.hidden, None),
                Err(e) => (None, UNAVAILABLE.to_string(), false, Some(e.to_string())),
            };

        let (step_grams, step_degraded) = match state.step(units) {
            Ok(step) => (Some(step.grams), step.degraded),
            Err(_) => (None, true),
        };
        if step_degraded && step_grams.is_some() {
            warnings.push(format!(
                "Input step for {} is a fallback until its reference value is set",
                state.selected_unit()
            ));
        }

        if state.nutrients.is_overfull() {
            warnings.push(format!(
                "Nutrients add up to {:.1}% without water; water is held at 0%",
                state.nutrients.editable_sum()
            ));
        }

        IngredientView {
            meal_id: state.meal_id.clone(),
            ingredient_id: state.ingredient_id.clone(),
            name: state.name.clone(),
            weight_grams: state.weight_grams(),
            unit: state.selected_unit().to_string(),
            quantity,
            quantity_display,
            conversion_hidden,
            conversion_status,
            step_grams,
            step_degraded,
            density: state.density(),
            pcs_weight: state.pcs_weight(),
            nutrients: state
                .nutrients
                .iter()
                .map(|(nutrient, percent)| NutrientLine {
                    nutrient,
                    percent,
                    derived: !nutrient.is_editable(),
                })
                .collect(),
            total_percent: state.nutrients.total_percent(),
            energy_density_kcal_per_kg: state.energy_density(),
            warnings,
            status: self.status.clone(),
            unsaved_changes: self.has_unsaved_changes(),
        }
    }
}

/// Values an ingredient is opened with, as the planning service reported them
#[derive(Debug, Clone, Default)]
pub struct OpenIngredient {
    pub meal_id: String,
    pub ingredient_id: String,
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub density: Option<f64>,
    pub pcs_weight: Option<f64>,
    pub unit: Option<String>,
    pub nutrients: Option<NutrientRatios>,
}

/// Open an ingredient, replacing whatever was being edited
pub fn open_ingredient(
    slot: &mut Option<EditSession>,
    units: &UnitTable,
    params: OpenIngredient,
) -> IngredientView {
    let snapshot = IngredientSnapshot {
        name: params.name,
        weight: params.weight,
        nutrients_map: params.nutrients,
        measurement_unit: params.unit,
        density: params.density,
        pcs_weight: params.pcs_weight,
    };
    let state =
        IngredientEditState::from_snapshot(params.meal_id, params.ingredient_id, &snapshot);
    tracing::info!("Opened ingredient {} in meal {}", state.ingredient_id, state.meal_id);

    let session = slot.insert(EditSession::open(state));
    session.view(units)
}

/// The open session, or an error telling the caller to open one
pub fn require_session(slot: &mut Option<EditSession>) -> Result<&mut EditSession, String> {
    slot.as_mut()
        .ok_or_else(|| "No ingredient is open; call open_ingredient first".to_string())
}

pub fn set_nutrient(
    session: &mut EditSession,
    units: &UnitTable,
    nutrient: &str,
    percent: f64,
) -> IngredientView {
    let _ = session.edit(|s| s.nutrients.set_nutrient_by_name(nutrient, percent));
    session.view(units)
}

pub fn set_weight(session: &mut EditSession, units: &UnitTable, grams: f64) -> IngredientView {
    let _ = session.edit(|s| s.set_weight(grams));
    session.view(units)
}

/// Set the weight from a quantity in the selected unit
pub fn set_quantity(session: &mut EditSession, units: &UnitTable, quantity: f64) -> IngredientView {
    let _ = session.edit(|s| s.set_quantity(units, quantity));
    session.view(units)
}

pub fn set_density(session: &mut EditSession, units: &UnitTable, density: f64) -> IngredientView {
    let _ = session.edit(|s| s.set_density(density));
    session.view(units)
}

pub fn select_unit(session: &mut EditSession, units: &UnitTable, unit: &str) -> IngredientView {
    let _ = session.edit(|s| s.select_unit(units, unit));
    session.view(units)
}

pub fn set_pieces_reference(
    session: &mut EditSession,
    units: &UnitTable,
    grams: f64,
) -> IngredientView {
    let _ = session.edit(|s| s.set_pieces_reference(grams));
    session.view(units)
}

pub fn clear_pieces_reference(session: &mut EditSession, units: &UnitTable) -> IngredientView {
    let _ = session.edit(|s| {
        s.clear_pieces_reference();
        Ok::<(), ValidationError>(())
    });
    session.view(units)
}

pub fn reset_ingredient(session: &mut EditSession, units: &UnitTable) -> IngredientView {
    session.reset_to_last_good();
    session.view(units)
}

/// Submit and report the outcome in the returned view's status
pub async fn submit_ingredient(
    session: &mut EditSession,
    units: &UnitTable,
    service: &dyn PlanningService,
) -> IngredientView {
    let _ = session.submit(service).await;
    session.view(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientUpdate;
    use crate::nutrition::{MeasurementUnitConfig, UnitTableSource};
    use crate::remote::{rejection_from_response, RemoteResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Reply {
        Accept,
        Reject(&'static str),
    }

    /// Planning service stand-in that records what it was sent
    struct FakeService {
        reply: Reply,
        sent: Mutex<Vec<IngredientUpdate>>,
    }

    impl FakeService {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PlanningService for FakeService {
        async fn measurement_units(&self) -> RemoteResult<Vec<MeasurementUnitConfig>> {
            Ok(Vec::new())
        }

        async fn update_ingredient(
            &self,
            _meal_id: &str,
            _ingredient_id: &str,
            update: &IngredientUpdate,
        ) -> RemoteResult<IngredientSnapshot> {
            self.sent.lock().unwrap().push(update.clone());
            match self.reply {
                Reply::Accept => {
                    // The service normalizes ratios so they sum to one
                    let sum = update.ratios.sum();
                    let scale = if sum > 0.0 { 1.0 / sum } else { 1.0 };
                    let r = &update.ratios;
                    Ok(IngredientSnapshot {
                        name: Some("Lentils".to_string()),
                        weight: Some(update.weight),
                        nutrients_map: Some(NutrientRatios {
                            protein: r.protein * scale,
                            fat: r.fat * scale,
                            carbs: r.carbs * scale,
                            water: r.water * scale,
                            fiber: r.fiber * scale,
                            salt: r.salt * scale,
                        }),
                        measurement_unit: Some(update.measurement_unit.clone()),
                        density: Some(update.density),
                        pcs_weight: update.pcs_weight,
                    })
                }
                Reply::Reject(body) => Err(rejection_from_response(400, body)),
            }
        }
    }

    fn units() -> UnitTable {
        UnitTable::from_configs(
            vec![MeasurementUnitConfig::new("TEASPOON", Some(5.0), true, "US volume (5ml)")],
            UnitTableSource::Remote,
        )
    }

    fn opened() -> EditSession {
        let mut slot = None;
        open_ingredient(
            &mut slot,
            &units(),
            OpenIngredient {
                meal_id: "meal-1".to_string(),
                ingredient_id: "ing-1".to_string(),
                weight: Some(100.0),
                nutrients: Some(NutrientRatios {
                    protein: 0.25,
                    carbs: 0.5,
                    water: 0.25,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        slot.unwrap()
    }

    #[test]
    fn test_require_session() {
        let mut slot = None;
        assert!(require_session(&mut slot).is_err());
        slot = Some(opened());
        assert!(require_session(&mut slot).is_ok());
    }

    #[test]
    fn test_open_with_partial_nutrients_derives_water() {
        let mut slot = None;
        let view = open_ingredient(
            &mut slot,
            &units(),
            OpenIngredient {
                meal_id: "meal-1".to_string(),
                ingredient_id: "ing-2".to_string(),
                nutrients: Some(NutrientRatios {
                    protein: 0.2,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let water = view
            .nutrients
            .iter()
            .find(|l| l.nutrient == Nutrient::Water)
            .unwrap();
        assert!((water.percent - 80.0).abs() < 1e-9);
        assert!((view.total_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_of_example_nutrients() {
        let mut session = opened();
        let table = units();
        set_nutrient(&mut session, &table, "protein", 20.0);
        set_nutrient(&mut session, &table, "fat", 10.0);
        set_nutrient(&mut session, &table, "carbs", 30.0);
        set_nutrient(&mut session, &table, "fiber", 5.0);
        let view = set_nutrient(&mut session, &table, "salt", 2.0);

        let water = view
            .nutrients
            .iter()
            .find(|l| l.nutrient == Nutrient::Water)
            .unwrap();
        assert!(water.derived);
        assert!((water.percent - 33.0).abs() < 1e-9);
        assert!((view.total_percent - 100.0).abs() < 0.01);
        assert!(view.warnings.is_empty());
        assert!(view.unsaved_changes);
        assert!(view.conversion_hidden);
    }

    #[test]
    fn test_invalid_edit_keeps_last_values() {
        let mut session = opened();
        let table = units();
        let view = set_nutrient(&mut session, &table, "protein", 140.0);
        assert!(view.status.unwrap().contains("between 0 and 100"));
        assert!(!view.unsaved_changes);
        assert!((session.state().nutrients.percent(Nutrient::Protein) - 25.0).abs() < 1e-9);

        let view = set_density(&mut session, &table, 0.0);
        assert!(view.status.is_some());
        assert_eq!(view.density, 1.0);

        let view = set_weight(&mut session, &table, 80.0);
        assert!(view.status.is_none());
        assert_eq!(view.weight_grams, 80.0);
    }

    #[test]
    fn test_overfull_warning() {
        let mut session = opened();
        let table = units();
        set_nutrient(&mut session, &table, "protein", 60.0);
        set_nutrient(&mut session, &table, "fat", 30.0);
        let view = set_nutrient(&mut session, &table, "carbs", 20.0);
        assert_eq!(session.state().nutrients.percent(Nutrient::Water), 0.0);
        assert!(view.total_percent > 100.0);
        assert_eq!(view.warnings.len(), 1);
    }

    #[test]
    fn test_pieces_view_unavailable_then_available() {
        let mut session = opened();
        let table = units();
        set_weight(&mut session, &table, 200.0);
        let view = select_unit(&mut session, &table, "pcs");
        assert_eq!(view.quantity, None);
        assert_eq!(view.quantity_display, UNAVAILABLE);
        assert!(view.conversion_status.is_some());
        assert!(view.step_degraded);

        let view = set_pieces_reference(&mut session, &table, 40.0);
        assert_eq!(view.quantity, Some(5.0));
        assert_eq!(view.quantity_display, "5");
        assert_eq!(view.step_grams, Some(40.0));

        let view = set_quantity(&mut session, &table, 3.0);
        assert_eq!(view.weight_grams, 120.0);

        let view = clear_pieces_reference(&mut session, &table);
        assert_eq!(view.pcs_weight, None);
        assert_eq!(view.quantity_display, UNAVAILABLE);
        assert_eq!(view.weight_grams, 120.0);
    }

    #[test]
    fn test_teaspoon_view() {
        let mut session = opened();
        let table = units();
        set_weight(&mut session, &table, 250.0);
        let view = select_unit(&mut session, &table, "TEASPOON");
        assert_eq!(view.quantity, Some(50.0));
        assert!(!view.conversion_hidden);

        let view = select_unit(&mut session, &table, "BARREL");
        assert_eq!(view.unit, "TEASPOON");
        assert!(view.status.unwrap().contains("BARREL"));
    }

    #[test]
    fn test_reset_to_last_good() {
        let mut session = opened();
        let table = units();
        set_nutrient(&mut session, &table, "fat", 40.0);
        set_weight(&mut session, &table, 999.0);
        let view = reset_ingredient(&mut session, &table);
        assert!(!view.unsaved_changes);
        assert_eq!(view.weight_grams, 100.0);
        assert_eq!(session.state().nutrients.percent(Nutrient::Fat), 0.0);
    }

    #[tokio::test]
    async fn test_submit_success_takes_server_state() {
        let mut session = opened();
        let table = units();
        let service = FakeService::new(Reply::Accept);

        set_nutrient(&mut session, &table, "protein", 60.0);
        set_nutrient(&mut session, &table, "fat", 30.0);
        set_nutrient(&mut session, &table, "carbs", 30.0);
        set_pieces_reference(&mut session, &table, 25.0);

        let view = submit_ingredient(&mut session, &table, &service).await;
        assert_eq!(view.status.as_deref(), Some("Saved"));
        assert!(!view.unsaved_changes);
        assert!((view.total_percent - 100.0).abs() < 0.01);
        assert!((session.state().nutrients.percent(Nutrient::Protein) - 50.0).abs() < 1e-9);
        assert_eq!(session.state().name.as_deref(), Some("Lentils"));
        assert_eq!(session.state().pcs_weight(), Some(25.0));

        let sent = service.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!((sent[0].ratios.protein - 0.6).abs() < 1e-12);
        assert_eq!(sent[0].ratios.water, 0.0);
    }

    #[tokio::test]
    async fn test_rejection_with_snapshot_resyncs() {
        let mut session = opened();
        let table = units();
        let service = FakeService::new(Reply::Reject(
            r#"{"message":"Nutrients exceed 100%","nutrientsMap":{"protein":0.3,"carbs":0.3,"water":0.4}}"#,
        ));

        set_nutrient(&mut session, &table, "protein", 90.0);
        set_weight(&mut session, &table, 400.0);

        let result = session.submit(&service).await;
        assert!(matches!(
            result,
            Err(SubmitError::Remote(RemoteError::Rejected { snapshot: Some(_), .. }))
        ));
        assert_eq!(session.status(), Some("Nutrients exceed 100%"));
        assert!((session.state().nutrients.percent(Nutrient::Protein) - 30.0).abs() < 1e-9);
        assert!((session.state().nutrients.percent(Nutrient::Water) - 40.0).abs() < 1e-9);
        assert_eq!(session.state().weight_grams(), 100.0);
        assert!(!session.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_rejection_with_current_nutrients_resyncs() {
        let mut session = opened();
        let table = units();
        let service = FakeService::new(Reply::Reject(
            r#"{"message":"Nutrient value cannot be negative","currentNutrients":{"protein":0.3,"fat":0.1,"carbs":0.2,"water":0.4,"fiber":0.0,"salt":0.0}}"#,
        ));

        set_nutrient(&mut session, &table, "fat", 45.0);
        let view = submit_ingredient(&mut session, &table, &service).await;
        assert_eq!(view.status.as_deref(), Some("Nutrient value cannot be negative"));
        assert!((session.state().nutrients.percent(Nutrient::Protein) - 30.0).abs() < 1e-9);
        assert!((session.state().nutrients.percent(Nutrient::Fat) - 10.0).abs() < 1e-9);
        assert!((session.state().nutrients.percent(Nutrient::Carbs) - 20.0).abs() < 1e-9);
        assert!((session.state().nutrients.percent(Nutrient::Water) - 40.0).abs() < 1e-9);
        assert!((view.total_percent - 100.0).abs() < 1e-9);
        assert!(!view.unsaved_changes);
    }

    #[tokio::test]
    async fn test_rejection_without_snapshot_reverts() {
        let mut session = opened();
        let table = units();
        let service = FakeService::new(Reply::Reject(r#"{"message":"Meal not found."}"#));

        set_nutrient(&mut session, &table, "salt", 3.0);
        let view = submit_ingredient(&mut session, &table, &service).await;
        assert_eq!(view.status.as_deref(), Some("Meal not found."));
        assert_eq!(session.state(), session.last_good());
        assert_eq!(session.state().nutrients.percent(Nutrient::Salt), 0.0);
    }

    #[tokio::test]
    async fn test_invalid_state_not_sent() {
        let table = units();
        let bad: crate::nutrition::NutrientPanel = serde_json::from_str(
            r#"{"protein":-5.0,"fat":0.0,"carbs":0.0,"water":100.0,"fiber":0.0,"salt":0.0}"#,
        )
        .unwrap();
        let mut state = IngredientEditState::new("m", "i");
        state.nutrients = bad;
        let mut session = EditSession::open(state);
        let service = FakeService::new(Reply::Accept);

        let result = session.submit(&service).await;
        assert!(matches!(
            result,
            Err(SubmitError::Validation(ValidationError::RangeViolation { .. }))
        ));
        assert!(service.sent.lock().unwrap().is_empty());
        assert!(session.view(&table).status.is_some());
    }
}
