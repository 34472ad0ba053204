//! Storage object operations: list, get, presigned downloads.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::page::{ListQuery, Page};
use crate::types::{DownloadUrl, StorageObject};

pub struct Objects<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct ObjectListResponse {
    #[serde(default)]
    objects: Vec<StorageObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    total_count: Option<u64>,
}

impl<'a> Objects<'a> {
    pub fn list(&self, query: &ListQuery) -> Result<Page<StorageObject>, ApiError> {
        self.list_at("/v1/objects", query)
    }

    /// Public objects shared across accounts.
    pub fn list_public(&self, query: &ListQuery) -> Result<Page<StorageObject>, ApiError> {
        self.list_at("/v1/objects/public", query)
    }

    fn list_at(&self, path: &str, query: &ListQuery) -> Result<Page<StorageObject>, ApiError> {
        let resp: ObjectListResponse = self.http.get(path, &query.to_params())?;
        Ok(Page {
            items: resp.objects,
            has_more: resp.has_more,
            total_count: resp.total_count,
        })
    }

    pub fn get(&self, id: &str) -> Result<StorageObject, ApiError> {
        self.http
            .get(&format!("/v1/objects/{id}"), &[])
            .map_err(|e| e.or_not_found("object", id))
    }

    /// Mint a presigned download URL valid for `duration_seconds`.
    pub fn download_url(&self, id: &str, duration_seconds: u64) -> Result<DownloadUrl, ApiError> {
        self.http
            .post(
                &format!("/v1/objects/{id}/download_url"),
                &json!({ "duration_seconds": duration_seconds }),
            )
            .map_err(|e| e.or_not_found("object", id))
    }

    /// Download from a presigned URL to a local file, reporting progress as
    /// `(bytes_downloaded, total_bytes)` after each chunk.
    ///
    /// Presigned URLs are served by the object store, not the API: the
    /// request is unauthenticated and bypasses the main client.
    pub fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        mut progress: impl FnMut(u64, Option<u64>),
    ) -> Result<u64, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut resp = client
            .get(url)
            .send()
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ApiError::Api {
                status: resp.status().as_u16(),
                message: format!("object store refused download ({})", resp.status()),
            });
        }

        let total = resp.content_length();
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(dest)?;

        let mut buf = [0u8; 8192];
        let mut downloaded: u64 = 0;
        loop {
            let n = resp
                .read(&mut buf)
                .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            downloaded += n as u64;
            progress(downloaded, total);
        }
        file.flush()?;
        Ok(downloaded)
    }
}
