//! Resource services — one module per remote resource, thin typed wrappers
//! over the HTTP transport.
//!
//! `DevlabClient` is the facade the TUI worker and the CLI hold on to:
//! `client.devboxes().list(...)`, `client.blueprints().get(...)`, etc.

pub mod benchmarks;
pub mod blueprints;
pub mod devboxes;
pub mod gateways;
pub mod mcp;
pub mod objects;
pub mod policies;

use crate::config::Config;
use crate::error::ApiError;
use crate::http::ApiClient;

pub use benchmarks::Benchmarks;
pub use blueprints::Blueprints;
pub use devboxes::Devboxes;
pub use gateways::Gateways;
pub use mcp::McpConfigs;
pub use objects::Objects;
pub use policies::NetworkPolicies;

/// Facade over all resource services. One per process; cheap to share by
/// reference (the worker thread owns one for the TUI's lifetime).
pub struct DevlabClient {
    http: ApiClient,
    ssh_proxy: String,
    dashboard_url: String,
}

impl DevlabClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Ok(Self {
            http: ApiClient::new(config)?,
            ssh_proxy: config.ssh_proxy.clone(),
            dashboard_url: config.dashboard_url.clone(),
        })
    }

    pub fn devboxes(&self) -> Devboxes<'_> {
        Devboxes { http: &self.http }
    }

    pub fn blueprints(&self) -> Blueprints<'_> {
        Blueprints { http: &self.http }
    }

    pub fn objects(&self) -> Objects<'_> {
        Objects { http: &self.http }
    }

    pub fn network_policies(&self) -> NetworkPolicies<'_> {
        NetworkPolicies { http: &self.http }
    }

    pub fn benchmarks(&self) -> Benchmarks<'_> {
        Benchmarks { http: &self.http }
    }

    pub fn mcp_configs(&self) -> McpConfigs<'_> {
        McpConfigs { http: &self.http }
    }

    pub fn gateway_configs(&self) -> Gateways<'_> {
        Gateways { http: &self.http }
    }

    /// `host:port` of the SSH proxy for the configured environment.
    pub fn ssh_proxy(&self) -> &str {
        &self.ssh_proxy
    }

    /// Web dashboard base URL for the configured environment.
    pub fn dashboard_url(&self) -> &str {
        &self.dashboard_url
    }
}
