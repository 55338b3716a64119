//! HTTP client for the planning service

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::{rejection_from_response, PlanningService, RemoteResult};
use crate::build_info::BuildInfo;
use crate::config::Config;
use crate::models::{IngredientSnapshot, IngredientUpdate};
use crate::nutrition::MeasurementUnitConfig;

/// reqwest-backed [`PlanningService`]
#[derive(Clone)]
pub struct HttpPlanningClient {
    client: Client,
    base_url: String,
}

impl HttpPlanningClient {
    pub fn new(config: &Config) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(BuildInfo::current().user_agent())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a 2xx body, or turn anything else into a rejection
    async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(rejection_from_response(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Query parameters for an ingredient update
///
/// An empty `pcsWeight` tells the service to clear the piece weight.
pub fn update_query(update: &IngredientUpdate) -> Vec<(&'static str, String)> {
    let r = &update.ratios;
    vec![
        ("weight", update.weight.to_string()),
        ("protein", r.protein.to_string()),
        ("fat", r.fat.to_string()),
        ("carbs", r.carbs.to_string()),
        ("water", r.water.to_string()),
        ("fiber", r.fiber.to_string()),
        ("salt", r.salt.to_string()),
        ("measurementUnit", update.measurement_unit.clone()),
        ("density", update.density.to_string()),
        (
            "pcsWeight",
            update.pcs_weight.map(|g| g.to_string()).unwrap_or_default(),
        ),
    ]
}

#[async_trait]
impl PlanningService for HttpPlanningClient {
    async fn measurement_units(&self) -> RemoteResult<Vec<MeasurementUnitConfig>> {
        let url = self.url("/configuration/measurement-units");
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn update_ingredient(
        &self,
        meal_id: &str,
        ingredient_id: &str,
        update: &IngredientUpdate,
    ) -> RemoteResult<IngredientSnapshot> {
        let url = self.url(&format!("/meals/{}/ingredients/{}", meal_id, ingredient_id));
        tracing::debug!("PUT {} (weight={}, unit={})", url, update.weight, update.measurement_unit);
        let response = self
            .client
            .put(&url)
            .query(&update_query(update))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
