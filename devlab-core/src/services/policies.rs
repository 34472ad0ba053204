//! Network policy operations.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::page::{ListQuery, Page};
use crate::types::NetworkPolicy;

pub struct NetworkPolicies<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct PolicyListResponse {
    #[serde(default)]
    network_policies: Vec<NetworkPolicy>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    total_count: Option<u64>,
}

impl<'a> NetworkPolicies<'a> {
    pub fn list(&self, query: &ListQuery) -> Result<Page<NetworkPolicy>, ApiError> {
        let resp: PolicyListResponse =
            self.http.get("/v1/network_policies", &query.to_params())?;
        Ok(Page {
            items: resp.network_policies,
            has_more: resp.has_more,
            total_count: resp.total_count,
        })
    }

    pub fn get(&self, id: &str) -> Result<NetworkPolicy, ApiError> {
        self.http
            .get(&format!("/v1/network_policies/{id}"), &[])
            .map_err(|e| e.or_not_found("network policy", id))
    }
}
