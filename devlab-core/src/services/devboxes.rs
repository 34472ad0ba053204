//! Devbox operations: lifecycle, exec, logs, files, SSH keys, snapshots.

use std::io::Write;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::http::{ApiClient, LineStream};
use crate::page::{ListQuery, Page};
use crate::types::{
    Devbox, DevboxCreateRequest, DevboxStatus, DiskSnapshot, Execution, LogEntry, SshKey,
};

pub struct Devboxes<'a> {
    pub(crate) http: &'a ApiClient,
}

#[derive(Debug, Deserialize)]
struct DevboxListResponse {
    #[serde(default)]
    devboxes: Vec<Devbox>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SnapshotListResponse {
    #[serde(default)]
    snapshots: Vec<DiskSnapshot>,
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

impl<'a> Devboxes<'a> {
    pub fn list(&self, query: &ListQuery) -> Result<Page<Devbox>, ApiError> {
        let resp: DevboxListResponse = self.http.get("/v1/devboxes", &query.to_params())?;
        Ok(Page {
            items: resp.devboxes,
            has_more: resp.has_more,
            total_count: resp.total_count,
        })
    }

    pub fn get(&self, id: &str) -> Result<Devbox, ApiError> {
        self.http
            .get(&format!("/v1/devboxes/{id}"), &[])
            .map_err(|e| e.or_not_found("devbox", id))
    }

    pub fn create(&self, req: &DevboxCreateRequest) -> Result<Devbox, ApiError> {
        self.http.post("/v1/devboxes", req)
    }

    pub fn suspend(&self, id: &str) -> Result<Devbox, ApiError> {
        self.lifecycle(id, "suspend")
    }

    pub fn resume(&self, id: &str) -> Result<Devbox, ApiError> {
        self.lifecycle(id, "resume")
    }

    pub fn shutdown(&self, id: &str) -> Result<Devbox, ApiError> {
        self.lifecycle(id, "shutdown")
    }

    fn lifecycle(&self, id: &str, verb: &str) -> Result<Devbox, ApiError> {
        self.http
            .post(&format!("/v1/devboxes/{id}/{verb}"), &json!({}))
            .map_err(|e| e.or_not_found("devbox", id))
    }

    /// Run a command and wait for its result in one call.
    pub fn execute_sync(
        &self,
        id: &str,
        command: &str,
        shell_name: Option<&str>,
    ) -> Result<Execution, ApiError> {
        self.http
            .post(
                &format!("/v1/devboxes/{id}/execute_sync"),
                &exec_body(command, shell_name),
            )
            .map_err(|e| e.or_not_found("devbox", id))
    }

    /// Start a command without waiting; poll with [`Devboxes::execution_status`].
    pub fn execute_async(
        &self,
        id: &str,
        command: &str,
        shell_name: Option<&str>,
    ) -> Result<Execution, ApiError> {
        self.http
            .post(
                &format!("/v1/devboxes/{id}/execute_async"),
                &exec_body(command, shell_name),
            )
            .map_err(|e| e.or_not_found("devbox", id))
    }

    pub fn execution_status(
        &self,
        id: &str,
        execution_id: &str,
    ) -> Result<Execution, ApiError> {
        self.http
            .get(&format!("/v1/devboxes/{id}/executions/{execution_id}"), &[])
            .map_err(|e| e.or_not_found("execution", execution_id))
    }

    /// Full log history for a devbox.
    pub fn logs(&self, id: &str) -> Result<Vec<LogEntry>, ApiError> {
        let resp: LogListResponse = self
            .http
            .get(&format!("/v1/devboxes/{id}/logs"), &[])
            .map_err(|e| e.or_not_found("devbox", id))?;
        Ok(resp.logs)
    }

    /// Log entries newer than `after_ms` — the polling half of the tail.
    pub fn logs_since(&self, id: &str, after_ms: i64) -> Result<Vec<LogEntry>, ApiError> {
        let mut logs = self.logs(id)?;
        logs.retain(|l| l.timestamp_ms.is_some_and(|ts| ts > after_ms));
        Ok(logs)
    }

    /// Open the streaming log tail (newline-delimited JSON). Callers fall
    /// back to [`Devboxes::logs_since`] polling when the stream dies.
    pub fn tail_logs(&self, id: &str) -> Result<LogTail, ApiError> {
        let lines = self
            .http
            .stream_lines(&format!("/v1/devboxes/{id}/logs/tail"), &[])
            .map_err(|e| e.or_not_found("devbox", id))?;
        Ok(LogTail { lines })
    }

    pub fn create_ssh_key(&self, id: &str) -> Result<SshKey, ApiError> {
        self.http
            .post(&format!("/v1/devboxes/{id}/create_ssh_key"), &json!({}))
            .map_err(|e| e.or_not_found("devbox", id))
    }

    pub fn read_file(&self, id: &str, file_path: &str) -> Result<String, ApiError> {
        self.http
            .post_text(
                &format!("/v1/devboxes/{id}/read_file_contents"),
                &json!({ "file_path": file_path }),
            )
            .map_err(|e| e.or_not_found("devbox", id))
    }

    pub fn write_file(&self, id: &str, file_path: &str, contents: &str) -> Result<(), ApiError> {
        self.http
            .post_discard(
                &format!("/v1/devboxes/{id}/write_file_contents"),
                &json!({ "file_path": file_path, "contents": contents }),
            )
            .map_err(|e| e.or_not_found("devbox", id))
    }

    /// Download a file from the devbox filesystem into `writer`.
    pub fn download_file<W: Write>(
        &self,
        id: &str,
        path: &str,
        writer: &mut W,
    ) -> Result<u64, ApiError> {
        self.http
            .post_stream_to(
                &format!("/v1/devboxes/{id}/download_file"),
                &json!({ "path": path }),
                writer,
            )
            .map_err(|e| e.or_not_found("devbox", id))
    }

    /// Start an asynchronous disk snapshot.
    pub fn snapshot_disk(&self, id: &str) -> Result<DiskSnapshot, ApiError> {
        self.http
            .post(&format!("/v1/devboxes/{id}/snapshot_disk_async"), &json!({}))
            .map_err(|e| e.or_not_found("devbox", id))
    }

    pub fn list_snapshots(&self, query: &ListQuery) -> Result<Page<DiskSnapshot>, ApiError> {
        let resp: SnapshotListResponse = self
            .http
            .get("/v1/devboxes/disk_snapshots", &query.to_params())?;
        Ok(Page {
            items: resp.snapshots,
            has_more: resp.has_more,
            total_count: resp.total_count,
        })
    }

    pub fn snapshot_status(&self, snapshot_id: &str) -> Result<DiskSnapshot, ApiError> {
        self.http
            .get(
                &format!("/v1/devboxes/disk_snapshots/{snapshot_id}/status"),
                &[],
            )
            .map_err(|e| e.or_not_found("snapshot", snapshot_id))
    }

    /// Poll until the devbox reaches `running`. Returns `Ok(false)` on a
    /// terminal/parked state or timeout. Transient errors keep polling.
    pub fn wait_for_ready(
        &self,
        id: &str,
        timeout: Duration,
        poll_interval: Duration,
        mut progress: impl FnMut(DevboxStatus, Duration),
    ) -> Result<bool, ApiError> {
        let start = Instant::now();
        loop {
            match self.get(id) {
                Ok(devbox) => match devbox.status {
                    DevboxStatus::Running => return Ok(true),
                    DevboxStatus::Failure
                    | DevboxStatus::Shutdown
                    | DevboxStatus::Suspended => return Ok(false),
                    status => progress(status, start.elapsed()),
                },
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(e),
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            std::thread::sleep(poll_interval);
        }
    }
}

fn exec_body(command: &str, shell_name: Option<&str>) -> serde_json::Value {
    match shell_name {
        Some(shell) => json!({ "command": command, "shell_name": shell }),
        None => json!({ "command": command }),
    }
}

/// Iterator over streamed log entries. Blank keep-alive lines are skipped;
/// a malformed line or transport error ends the stream with an error the
/// caller uses to trigger the polling fallback.
pub struct LogTail {
    lines: LineStream,
}

impl Iterator for LogTail {
    type Item = Result<LogEntry, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str(&line)
                            .map_err(|e| ApiError::StreamClosed(format!("bad log frame: {e}"))),
                    );
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_body_omits_shell_when_unset() {
        let body = exec_body("ls -la", None);
        assert_eq!(body, json!({ "command": "ls -la" }));

        let body = exec_body("ls", Some("bash"));
        assert_eq!(body["shell_name"], "bash");
    }

    #[test]
    fn list_envelope_tolerates_missing_fields() {
        let resp: DevboxListResponse = serde_json::from_str(r#"{"devboxes": []}"#).unwrap();
        assert!(!resp.has_more);
        assert!(resp.total_count.is_none());

        let resp: DevboxListResponse = serde_json::from_str(
            r#"{"devboxes": [{"id": "dbx_1", "status": "running"}], "has_more": true, "total_count": 7}"#,
        )
        .unwrap();
        assert_eq!(resp.devboxes.len(), 1);
        assert!(resp.has_more);
        assert_eq!(resp.total_count, Some(7));
    }
}
