//! MCP server configuration listings (read-only).

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::types::McpConfig;

pub struct McpConfigs<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct McpListResponse {
    #[serde(default)]
    mcp_configs: Vec<McpConfig>,
}

impl<'a> McpConfigs<'a> {
    pub fn list(&self) -> Result<Vec<McpConfig>, ApiError> {
        let resp: McpListResponse = self.http.get("/v1/mcp_configs", &[])?;
        Ok(resp.mcp_configs)
    }

    pub fn get(&self, id: &str) -> Result<McpConfig, ApiError> {
        self.http
            .get(&format!("/v1/mcp_configs/{id}"), &[])
            .map_err(|e| e.or_not_found("mcp config", id))
    }
}
