//! Benchmark job operations.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::page::{ListQuery, Page};
use crate::types::BenchmarkJob;

pub struct Benchmarks<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct JobListResponse {
    #[serde(default)]
    jobs: Vec<BenchmarkJob>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    total_count: Option<u64>,
}

impl<'a> Benchmarks<'a> {
    pub fn list_jobs(&self, query: &ListQuery) -> Result<Page<BenchmarkJob>, ApiError> {
        let resp: JobListResponse = self.http.get("/v1/benchmarks/jobs", &query.to_params())?;
        Ok(Page {
            items: resp.jobs,
            has_more: resp.has_more,
            total_count: resp.total_count,
        })
    }

    pub fn get_job(&self, id: &str) -> Result<BenchmarkJob, ApiError> {
        self.http
            .get(&format!("/v1/benchmarks/jobs/{id}"), &[])
            .map_err(|e| e.or_not_found("benchmark job", id))
    }
}
