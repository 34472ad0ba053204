//! Gateway configuration listings (read-only).

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::types::GatewayConfig;

pub struct Gateways<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct GatewayListResponse {
    #[serde(default)]
    gateway_configs: Vec<GatewayConfig>,
}

impl<'a> Gateways<'a> {
    pub fn list(&self) -> Result<Vec<GatewayConfig>, ApiError> {
        let resp: GatewayListResponse = self.http.get("/v1/gateway_configs", &[])?;
        Ok(resp.gateway_configs)
    }

    pub fn get(&self, id: &str) -> Result<GatewayConfig, ApiError> {
        self.http
            .get(&format!("/v1/gateway_configs/{id}"), &[])
            .map_err(|e| e.or_not_found("gateway config", id))
    }
}
