//! Blueprint operations: create, preview, list, get, build logs.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::page::{ListQuery, Page};
use crate::types::{Blueprint, BlueprintCreateRequest, BlueprintPreview, LogEntry};

pub struct Blueprints<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct BlueprintListResponse {
    #[serde(default)]
    blueprints: Vec<Blueprint>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LogListResponse {
    #[serde(default)]
    logs: Vec<LogEntry>,
}

impl<'a> Blueprints<'a> {
    pub fn list(&self, query: &ListQuery) -> Result<Page<Blueprint>, ApiError> {
        let resp: BlueprintListResponse = self.http.get("/v1/blueprints", &query.to_params())?;
        Ok(Page {
            items: resp.blueprints,
            has_more: resp.has_more,
            total_count: resp.total_count,
        })
    }

    pub fn get(&self, id: &str) -> Result<Blueprint, ApiError> {
        self.http
            .get(&format!("/v1/blueprints/{id}"), &[])
            .map_err(|e| e.or_not_found("blueprint", id))
    }

    /// Create a blueprint; the build runs server-side. Poll the returned
    /// blueprint's status, or watch `logs`.
    pub fn create(&self, req: &BlueprintCreateRequest) -> Result<Blueprint, ApiError> {
        self.http.post("/v1/blueprints", req)
    }

    /// Render the final dockerfile without building anything.
    pub fn preview(&self, req: &BlueprintCreateRequest) -> Result<BlueprintPreview, ApiError> {
        self.http.post("/v1/blueprints/preview", req)
    }

    /// Build logs for a blueprint.
    pub fn logs(&self, id: &str) -> Result<Vec<LogEntry>, ApiError> {
        let resp: LogListResponse = self
            .http
            .get(&format!("/v1/blueprints/{id}/logs"), &[])
            .map_err(|e| e.or_not_found("blueprint", id))?;
        Ok(resp.logs)
    }
}
