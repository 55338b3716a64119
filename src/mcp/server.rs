//! Ration MCP Server Implementation
//!
//! Exposes the ingredient edit session as MCP tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::nutrition::{NutrientRatios, UnitTable};
use crate::remote::PlanningService;
use crate::tools::ingredients::{self, EditSession, OpenIngredient};
use crate::tools::status::StatusTracker;

/// Ration MCP Service
#[derive(Clone)]
pub struct RationService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    planner: Arc<dyn PlanningService>,
    units: Arc<UnitTable>,
    /// The single ingredient being edited
    session: Arc<Mutex<Option<EditSession>>>,
    tool_router: ToolRouter<RationService>,
}

impl RationService {
    pub fn new(api_base_url: String, planner: Arc<dyn PlanningService>, units: UnitTable) -> Self {
        let tracker = StatusTracker::new(api_base_url, &units);
        Self {
            status_tracker: Arc::new(Mutex::new(tracker)),
            planner,
            units: Arc::new(units),
            session: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OpenIngredientParams {
    /// Meal the ingredient belongs to
    pub meal_id: String,
    /// Ingredient ID
    pub ingredient_id: String,
    pub name: Option<String>,
    /// Current weight in grams
    pub weight: Option<f64>,
    /// Density in g/ml (default 1.0)
    pub density: Option<f64>,
    /// Grams per piece, if known
    pub pcs_weight: Option<f64>,
    /// Display unit name, e.g. GRAM, PCS, TEASPOON (default GRAM)
    pub unit: Option<String>,
    /// Current nutrient ratios (0-1) as reported by the planner; water is derived
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub fiber: Option<f64>,
    pub salt: Option<f64>,
}

impl OpenIngredientParams {
    fn ratios(&self) -> Option<NutrientRatios> {
        let fields = [self.protein, self.fat, self.carbs, self.fiber, self.salt];
        if fields.iter().all(Option::is_none) {
            return None;
        }
        Some(NutrientRatios {
            protein: self.protein.unwrap_or(0.0),
            fat: self.fat.unwrap_or(0.0),
            carbs: self.carbs.unwrap_or(0.0),
            water: 0.0,
            fiber: self.fiber.unwrap_or(0.0),
            salt: self.salt.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetNutrientParams {
    /// One of protein, fat, carbs, fiber, salt (water is derived)
    pub nutrient: String,
    /// Percentage between 0 and 100
    pub percent: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetWeightParams {
    /// Weight in grams
    pub grams: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetQuantityParams {
    /// Quantity in the currently selected unit
    pub quantity: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDensityParams {
    /// Density in g/ml, greater than 0
    pub density: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectUnitParams {
    /// Unit name from list_units
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPiecesReferenceParams {
    /// Grams per piece, greater than 0
    pub grams: f64,
}

// ============================================================================
// Tools
// ============================================================================

#[tool_router]
impl RationService {
    // --- Status ---

    #[tool(description = "Get the current status of the Ration service including build info, planning service URL, unit table source, and process information")]
    async fn ration_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status())
    }

    #[tool(description = "Get step-by-step instructions for editing an ingredient's nutrients and weight. Call this before the first edit.")]
    fn edit_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::EDIT_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(EDIT_INSTRUCTIONS)]))
    }

    #[tool(description = "List the measurement units available for display and input")]
    fn list_units(&self) -> Result<CallToolResult, McpError> {
        let body = serde_json::json!({
            "source": self.units.source(),
            "units": self.units.units(),
        });
        json_result(&body)
    }

    // --- Ingredient editing ---

    #[tool(description = "Open an ingredient for editing with its current values. Replaces any ingredient being edited.")]
    async fn open_ingredient(&self, Parameters(p): Parameters<OpenIngredientParams>) -> Result<CallToolResult, McpError> {
        let nutrients = p.ratios();
        let params = OpenIngredient {
            meal_id: p.meal_id, ingredient_id: p.ingredient_id, name: p.name,
            weight: p.weight, density: p.density, pcs_weight: p.pcs_weight,
            unit: p.unit, nutrients,
        };
        let mut slot = self.session.lock().await;
        let view = ingredients::open_ingredient(&mut slot, &self.units, params);
        json_result(&view)
    }

    #[tool(description = "Show the ingredient being edited: weight, display quantity, step size, nutrients and status")]
    async fn show_ingredient(&self) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&session.view(&self.units))
    }

    #[tool(description = "Set protein, fat, carbs, fiber or salt as a percentage (0-100). Water is recomputed as the remainder.")]
    async fn set_nutrient(&self, Parameters(p): Parameters<SetNutrientParams>) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::set_nutrient(session, &self.units, &p.nutrient, p.percent))
    }

    #[tool(description = "Set the ingredient weight in grams")]
    async fn set_weight(&self, Parameters(p): Parameters<SetWeightParams>) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::set_weight(session, &self.units, p.grams))
    }

    #[tool(description = "Set the ingredient weight from a quantity in the selected unit")]
    async fn set_quantity(&self, Parameters(p): Parameters<SetQuantityParams>) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::set_quantity(session, &self.units, p.quantity))
    }

    #[tool(description = "Set the ingredient density in g/ml, used for volume units")]
    async fn set_density(&self, Parameters(p): Parameters<SetDensityParams>) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::set_density(session, &self.units, p.density))
    }

    #[tool(description = "Select the unit the weight is displayed and entered in")]
    async fn select_unit(&self, Parameters(p): Parameters<SelectUnitParams>) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::select_unit(session, &self.units, &p.unit))
    }

    #[tool(description = "Set the weight of one piece in grams, enabling the PCS unit")]
    async fn set_pieces_reference(&self, Parameters(p): Parameters<SetPiecesReferenceParams>) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::set_pieces_reference(session, &self.units, p.grams))
    }

    #[tool(description = "Remove the piece weight")]
    async fn clear_pieces_reference(&self) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::clear_pieces_reference(session, &self.units))
    }

    #[tool(description = "Send the edit to the planning service. On rejection the last saved values are restored.")]
    async fn submit_ingredient(&self) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        let view = ingredients::submit_ingredient(session, &self.units, self.planner.as_ref()).await;
        json_result(&view)
    }

    #[tool(description = "Discard local edits and go back to the last saved values")]
    async fn reset_ingredient(&self) -> Result<CallToolResult, McpError> {
        let mut slot = self.session.lock().await;
        let session = ingredients::require_session(&mut slot).map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&ingredients::reset_ingredient(session, &self.units))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for RationService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ration".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Ration ingredient editor".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ration - Edit adventure ingredients: nutrients, weight and display units. \
                 IMPORTANT: Call edit_instructions before the first edit. \
                 Start with open_ingredient, adjust with set_nutrient/set_weight/set_quantity/set_density/select_unit, \
                 set_pieces_reference/clear_pieces_reference, then submit_ingredient. \
                 reset_ingredient restores the last saved values. list_units shows available units."
                    .into(),
            ),
        }
    }
}
