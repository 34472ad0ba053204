//! DTOs mirrored from the remote API.
//!
//! Shapes are owned by the server; locally these are transient copies held
//! in per-screen state. Status enums keep an `Unknown` catch-all so a new
//! server-side state never breaks deserialization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::page::Identified;

// ---------------------------------------------------------------------------
// Devboxes

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevboxStatus {
    Provisioning,
    Initializing,
    Running,
    Suspending,
    Suspended,
    Resuming,
    Failure,
    Shutdown,
    #[serde(other)]
    Unknown,
}

impl DevboxStatus {
    /// Filterable states, in the order the TUI cycles them.
    pub const FILTERABLE: [DevboxStatus; 5] = [
        DevboxStatus::Running,
        DevboxStatus::Suspended,
        DevboxStatus::Provisioning,
        DevboxStatus::Failure,
        DevboxStatus::Shutdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevboxStatus::Provisioning => "provisioning",
            DevboxStatus::Initializing => "initializing",
            DevboxStatus::Running => "running",
            DevboxStatus::Suspending => "suspending",
            DevboxStatus::Suspended => "suspended",
            DevboxStatus::Resuming => "resuming",
            DevboxStatus::Failure => "failure",
            DevboxStatus::Shutdown => "shutdown",
            DevboxStatus::Unknown => "unknown",
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DevboxStatus::Shutdown | DevboxStatus::Failure)
    }
}

impl fmt::Display for DevboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Devbox {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: DevboxStatus,
    #[serde(default)]
    pub blueprint_id: Option<String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub create_time_ms: Option<i64>,
    #[serde(default)]
    pub end_time_ms: Option<i64>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub launch_parameters: Option<LaunchParameters>,
}

impl Identified for Devbox {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceSize {
    Small,
    Medium,
    Large,
    XLarge,
}

impl FromStr for ResourceSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SMALL" => Ok(ResourceSize::Small),
            "MEDIUM" => Ok(ResourceSize::Medium),
            "LARGE" => Ok(ResourceSize::Large),
            "X_LARGE" | "XLARGE" => Ok(ResourceSize::XLarge),
            other => Err(format!(
                "unknown resource size '{other}' (expected SMALL, MEDIUM, LARGE, X_LARGE)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleAction {
    Shutdown,
    Suspend,
}

impl FromStr for IdleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shutdown" => Ok(IdleAction::Shutdown),
            "suspend" => Ok(IdleAction::Suspend),
            other => Err(format!(
                "unknown idle action '{other}' (expected shutdown or suspend)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfterIdle {
    pub idle_time_seconds: u64,
    pub on_idle: IdleAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserParameters {
    pub username: String,
    pub uid: u32,
}

impl UserParameters {
    pub fn root() -> Self {
        Self {
            username: "root".into(),
            uid: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_size_request: Option<ResourceSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_ports: Option<Vec<u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_idle: Option<AfterIdle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_parameters: Option<UserParameters>,
}

/// Body for `POST /v1/devboxes`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DevboxCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_commands: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_parameters: Option<LaunchParameters>,
}

// ---------------------------------------------------------------------------
// Executions and logs

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Queued,
    Running,
    Completed,
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Queued => "queued",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: String,
    pub devbox_id: String,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub exit_status: Option<i64>,
}

/// One devbox or blueprint log record. Normally exactly one of `message`,
/// `cmd`, `exit_code` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cmd: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i64>,
}

impl LogEntry {
    /// Render one line the way `devbox logs` prints it.
    pub fn display_line(&self) -> String {
        let time = self
            .timestamp_ms
            .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms))
            .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_default();
        let source = self
            .source
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();

        if let Some(cmd) = &self.cmd {
            format!("{time}{source} -> {cmd}")
        } else if let Some(message) = &self.message {
            format!("{time}{source}  {message}")
        } else if let Some(code) = self.exit_code {
            format!("{time}{source} -> exit_code={code}")
        } else {
            format!("{time}{source}")
        }
    }
}

// ---------------------------------------------------------------------------
// Blueprints

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueprintStatus {
    Provisioning,
    Building,
    Failed,
    BuildComplete,
    #[serde(other)]
    Unknown,
}

impl BlueprintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlueprintStatus::Provisioning => "provisioning",
            BlueprintStatus::Building => "building",
            BlueprintStatus::Failed => "failed",
            BlueprintStatus::BuildComplete => "build_complete",
            BlueprintStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    pub status: BlueprintStatus,
    #[serde(default)]
    pub create_time_ms: Option<i64>,
    #[serde(default)]
    pub dockerfile: Option<String>,
    #[serde(default)]
    pub system_setup_commands: Option<Vec<String>>,
    #[serde(default)]
    pub launch_parameters: Option<LaunchParameters>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl Identified for Blueprint {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Body for `POST /v1/blueprints` and `POST /v1/blueprints/preview`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlueprintCreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_setup_commands: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_parameters: Option<LaunchParameters>,
}

/// Server-side dockerfile render, no build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintPreview {
    pub dockerfile: String,
}

// ---------------------------------------------------------------------------
// Disk snapshots

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    InProgress,
    Complete,
    Error,
    #[serde(other)]
    Unknown,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::InProgress => "in_progress",
            SnapshotStatus::Complete => "complete",
            SnapshotStatus::Error => "error",
            SnapshotStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSnapshot {
    pub id: String,
    pub devbox_id: String,
    pub status: SnapshotStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub create_time_ms: Option<i64>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl Identified for DiskSnapshot {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Storage objects

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectState {
    Uploading,
    ReadOnly,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl ObjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectState::Uploading => "uploading",
            ObjectState::ReadOnly => "read_only",
            ObjectState::Deleted => "deleted",
            ObjectState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageObject {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub state: ObjectState,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub create_time_ms: Option<i64>,
}

impl Identified for StorageObject {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Response of `POST /v1/objects/{id}/download_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadUrl {
    pub download_url: String,
}

// ---------------------------------------------------------------------------
// Network policies

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPolicy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    #[serde(default)]
    pub deny_by_default: bool,
    #[serde(default)]
    pub create_time_ms: Option<i64>,
}

impl Identified for NetworkPolicy {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Benchmark jobs

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
            JobStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkJob {
    pub id: String,
    pub benchmark_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub scenario_count: u64,
    #[serde(default)]
    pub passed_count: u64,
    #[serde(default)]
    pub start_time_ms: Option<i64>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

impl Identified for BenchmarkJob {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Settings resources

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub enabled: bool,
}

impl Identified for McpConfig {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl Identified for GatewayConfig {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// SSH

/// Response of `POST /v1/devboxes/{id}/create_ssh_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshKey {
    pub ssh_private_key: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Display helpers

/// Format a millisecond epoch for table cells ("2026-08-08 14:02").
pub fn fmt_epoch_ms(ms: Option<i64>) -> String {
    ms.and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Human-readable byte count.
pub fn fmt_bytes(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return "-".to_string();
    };
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devbox_deserializes_with_minimal_fields() {
        let json = r#"{"id": "dbx_1", "status": "running"}"#;
        let devbox: Devbox = serde_json::from_str(json).unwrap();
        assert_eq!(devbox.id, "dbx_1");
        assert_eq!(devbox.status, DevboxStatus::Running);
        assert!(devbox.name.is_none());
        assert!(devbox.launch_parameters.is_none());
    }

    #[test]
    fn unknown_status_does_not_break_deserialization() {
        let json = r#"{"id": "dbx_1", "status": "hibernating"}"#;
        let devbox: Devbox = serde_json::from_str(json).unwrap();
        assert_eq!(devbox.status, DevboxStatus::Unknown);
    }

    #[test]
    fn launch_parameters_roundtrip() {
        let params = LaunchParameters {
            resource_size_request: Some(ResourceSize::Large),
            after_idle: Some(AfterIdle {
                idle_time_seconds: 600,
                on_idle: IdleAction::Suspend,
            }),
            ..LaunchParameters::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"LARGE\""));
        assert!(json.contains("\"suspend\""));
        assert!(!json.contains("architecture"));

        let back: LaunchParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resource_size_request, Some(ResourceSize::Large));
    }

    #[test]
    fn create_request_omits_unset_fields() {
        let req = DevboxCreateRequest {
            blueprint_id: Some("bpt_1".into()),
            ..DevboxCreateRequest::default()
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"blueprint_id":"bpt_1"}"#);
    }

    #[test]
    fn resource_size_parses_loosely() {
        assert_eq!("small".parse::<ResourceSize>().unwrap(), ResourceSize::Small);
        assert_eq!(
            "X_LARGE".parse::<ResourceSize>().unwrap(),
            ResourceSize::XLarge
        );
        assert!("huge".parse::<ResourceSize>().is_err());
    }

    #[test]
    fn log_line_formats_by_kind() {
        let base = LogEntry {
            timestamp_ms: Some(1_700_000_000_000),
            source: Some("setup_commands".into()),
            level: None,
            message: None,
            cmd: None,
            exit_code: None,
        };

        let cmd = LogEntry {
            cmd: Some("apt install pipx".into()),
            ..base.clone()
        };
        assert_eq!(
            cmd.display_line(),
            "2023-11-14 22:13:20.000 [setup_commands] -> apt install pipx"
        );

        let msg = LogEntry {
            message: Some("hello".into()),
            ..base.clone()
        };
        assert!(msg.display_line().ends_with("[setup_commands]  hello"));

        let exit = LogEntry {
            exit_code: Some(0),
            ..base
        };
        assert!(exit.display_line().ends_with("-> exit_code=0"));
    }

    #[test]
    fn log_line_without_timestamp_or_source() {
        let entry = LogEntry {
            timestamp_ms: None,
            source: None,
            level: None,
            message: Some("boot".into()),
            cmd: None,
            exit_code: None,
        };
        assert_eq!(entry.display_line(), "  boot");
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(fmt_bytes(None), "-");
        assert_eq!(fmt_bytes(Some(512)), "512 B");
        assert_eq!(fmt_bytes(Some(2048)), "2.0 KiB");
        assert_eq!(fmt_bytes(Some(5 * 1024 * 1024)), "5.0 MiB");
    }

    #[test]
    fn epoch_formatting() {
        assert_eq!(fmt_epoch_ms(None), "-");
        assert_eq!(fmt_epoch_ms(Some(1_700_000_000_000)), "2023-11-14 22:13");
    }
}
