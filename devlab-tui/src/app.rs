//! Application state — single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use devlab_core::types::{
    BenchmarkJob, Blueprint, Devbox, DevboxCreateRequest, DevboxStatus, DiskSnapshot, Execution,
    GatewayConfig, McpConfig, NetworkPolicy, StorageObject,
};

use crate::logs::LogView;
use crate::pager::Pager;
use crate::worker::{WorkerCommand, WorkerResponse};

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Devboxes,
    Blueprints,
    Snapshots,
    Objects,
    Policies,
    Benchmarks,
    Settings,
    Help,
}

impl Panel {
    pub const COUNT: usize = 8;

    pub fn index(self) -> usize {
        match self {
            Panel::Devboxes => 0,
            Panel::Blueprints => 1,
            Panel::Snapshots => 2,
            Panel::Objects => 3,
            Panel::Policies => 4,
            Panel::Benchmarks => 5,
            Panel::Settings => 6,
            Panel::Help => 7,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Devboxes),
            1 => Some(Panel::Blueprints),
            2 => Some(Panel::Snapshots),
            3 => Some(Panel::Objects),
            4 => Some(Panel::Policies),
            5 => Some(Panel::Benchmarks),
            6 => Some(Panel::Settings),
            7 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Devboxes => "Devboxes",
            Panel::Blueprints => "Blueprints",
            Panel::Snapshots => "Snapshots",
            Panel::Objects => "Objects",
            Panel::Policies => "Policies",
            Panel::Benchmarks => "Benchmarks",
            Panel::Settings => "Settings",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap()
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap()
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Decode,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Api => "API",
            ErrorCategory::Decode => "DEC",
            ErrorCategory::Other => "ERR",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "network" => ErrorCategory::Network,
            "api" => ErrorCategory::Api,
            "decode" => ErrorCategory::Decode,
            _ => ErrorCategory::Other,
        }
    }
}

/// Generic list-panel state: one page of items plus pagination bookkeeping.
#[derive(Debug)]
pub struct ListPane<T> {
    pub pager: Pager,
    pub items: Vec<T>,
    pub cursor: usize,
    pub loading: bool,
    pub total: Option<u64>,
}

impl<T> ListPane<T> {
    pub fn new(limit: u32) -> Self {
        Self {
            pager: Pager::new(limit),
            items: Vec::new(),
            cursor: 0,
            loading: false,
            total: None,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() && self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    /// Install a freshly-fetched page.
    pub fn apply_page(
        &mut self,
        items: Vec<T>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    ) {
        self.items = items;
        self.pager.record(has_more, next_cursor);
        self.total = total;
        self.loading = false;
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }
}

/// Devboxes panel adds a server-side status filter.
#[derive(Debug)]
pub struct DevboxPane {
    pub list: ListPane<Devbox>,
    pub status_filter: Option<DevboxStatus>,
}

impl DevboxPane {
    pub fn new(limit: u32) -> Self {
        Self {
            list: ListPane::new(limit),
            status_filter: None,
        }
    }

    /// Cycle the filter: all → running → suspended → provisioning →
    /// failure → shutdown → all.
    pub fn cycle_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(DevboxStatus::FILTERABLE[0]),
            Some(current) => DevboxStatus::FILTERABLE
                .iter()
                .position(|s| *s == current)
                .and_then(|i| DevboxStatus::FILTERABLE.get(i + 1))
                .copied(),
        };
    }
}

/// Settings panel lists two unpaged resources.
#[derive(Debug, Default)]
pub struct SettingsPane {
    pub mcp: Vec<McpConfig>,
    pub gateways: Vec<GatewayConfig>,
    pub cursor: usize,
    pub loading: bool,
    pub loaded: bool,
}

impl SettingsPane {
    pub fn row_count(&self) -> usize {
        self.mcp.len() + self.gateways.len()
    }
}

/// Exec overlay state: command input, then live execution status.
#[derive(Debug)]
pub struct ExecState {
    pub devbox_id: String,
    pub input: String,
    pub running: bool,
    pub result: Option<Execution>,
}

impl ExecState {
    pub fn new(devbox_id: String) -> Self {
        Self {
            devbox_id,
            input: String::new(),
            running: false,
            result: None,
        }
    }
}

/// New-devbox form. Field order is fixed; all fields are free text.
#[derive(Debug, Default)]
pub struct CreateForm {
    pub fields: [String; 5],
    pub active: usize,
    pub submitting: bool,
}

impl CreateForm {
    pub const LABELS: [&'static str; 5] = [
        "Name",
        "Blueprint id",
        "Snapshot id",
        "Entrypoint",
        "Env vars (k=v, comma separated)",
    ];

    pub fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Build the create request, validating the env var list.
    pub fn to_request(&self) -> Result<DevboxCreateRequest, String> {
        let trimmed: Vec<Option<String>> = self
            .fields
            .iter()
            .map(|f| {
                let t = f.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            })
            .collect();

        if trimmed[1].is_some() && trimmed[2].is_some() {
            return Err("Set a blueprint id or a snapshot id, not both".into());
        }

        let environment_variables = match &trimmed[4] {
            Some(raw) => {
                let mut vars = BTreeMap::new();
                for pair in raw.split(',') {
                    let pair = pair.trim();
                    if pair.is_empty() {
                        continue;
                    }
                    let (key, value) = pair
                        .split_once('=')
                        .ok_or_else(|| format!("Invalid env var '{pair}' (expected k=v)"))?;
                    vars.insert(key.trim().to_string(), value.trim().to_string());
                }
                if vars.is_empty() {
                    None
                } else {
                    Some(vars)
                }
            }
            None => None,
        };

        Ok(DevboxCreateRequest {
            name: trimmed[0].clone(),
            blueprint_id: trimmed[1].clone(),
            snapshot_id: trimmed[2].clone(),
            entrypoint: trimmed[3].clone(),
            environment_variables,
            ..DevboxCreateRequest::default()
        })
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Detail,
    Logs,
    Exec,
    Create,
    ConfirmShutdown { id: String },
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Panel states
    pub devboxes: DevboxPane,
    pub blueprints: ListPane<Blueprint>,
    pub snapshots: ListPane<DiskSnapshot>,
    pub objects: ListPane<StorageObject>,
    pub policies: ListPane<NetworkPolicy>,
    pub benchmarks: ListPane<BenchmarkJob>,
    pub settings: SettingsPane,

    // Overlays
    pub overlay: Overlay,
    pub log_view: Option<LogView>,
    pub exec: Option<ExecState>,
    pub form: CreateForm,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub cancel: Arc<AtomicBool>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,

    // Environment
    pub dashboard_url: String,
    #[allow(dead_code)]
    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        cancel: Arc<AtomicBool>,
        dashboard_url: String,
        state_path: PathBuf,
    ) -> Self {
        Self {
            active_panel: Panel::Devboxes,
            running: true,
            devboxes: DevboxPane::new(DEFAULT_PAGE_SIZE),
            blueprints: ListPane::new(DEFAULT_PAGE_SIZE),
            snapshots: ListPane::new(DEFAULT_PAGE_SIZE),
            objects: ListPane::new(DEFAULT_PAGE_SIZE),
            policies: ListPane::new(DEFAULT_PAGE_SIZE),
            benchmarks: ListPane::new(DEFAULT_PAGE_SIZE),
            settings: SettingsPane::default(),
            overlay: Overlay::None,
            log_view: None,
            exec: None,
            form: CreateForm::default(),
            worker_tx,
            worker_rx,
            cancel,
            status_message: None,
            error_history: VecDeque::with_capacity(50),
            error_scroll: 0,
            dashboard_url,
            state_path,
        }
    }

    pub fn send(&self, cmd: WorkerCommand) {
        let _ = self.worker_tx.send(cmd);
    }

    /// Stop whatever long-running loop the worker is in (log tail, exec poll).
    pub fn cancel_worker_loop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Re-fetch the current page of the given panel.
    pub fn reload(&mut self, panel: Panel) {
        match panel {
            Panel::Devboxes => {
                self.devboxes.list.loading = true;
                self.send(WorkerCommand::LoadDevboxes {
                    req: self.devboxes.list.pager.refresh(),
                    status: self.devboxes.status_filter,
                });
            }
            Panel::Blueprints => {
                self.blueprints.loading = true;
                self.send(WorkerCommand::LoadBlueprints {
                    req: self.blueprints.pager.refresh(),
                });
            }
            Panel::Snapshots => {
                self.snapshots.loading = true;
                self.send(WorkerCommand::LoadSnapshots {
                    req: self.snapshots.pager.refresh(),
                });
            }
            Panel::Objects => {
                self.objects.loading = true;
                self.send(WorkerCommand::LoadObjects {
                    req: self.objects.pager.refresh(),
                });
            }
            Panel::Policies => {
                self.policies.loading = true;
                self.send(WorkerCommand::LoadPolicies {
                    req: self.policies.pager.refresh(),
                });
            }
            Panel::Benchmarks => {
                self.benchmarks.loading = true;
                self.send(WorkerCommand::LoadBenchmarks {
                    req: self.benchmarks.pager.refresh(),
                });
            }
            Panel::Settings => {
                self.settings.loading = true;
                self.send(WorkerCommand::LoadSettings);
            }
            Panel::Help => {}
        }
    }

    /// First visit to a panel triggers its initial load.
    pub fn activate_panel(&mut self, panel: Panel) {
        self.active_panel = panel;
        let needs_load = match panel {
            Panel::Devboxes => self.devboxes.list.items.is_empty() && !self.devboxes.list.loading,
            Panel::Blueprints => self.blueprints.items.is_empty() && !self.blueprints.loading,
            Panel::Snapshots => self.snapshots.items.is_empty() && !self.snapshots.loading,
            Panel::Objects => self.objects.items.is_empty() && !self.objects.loading,
            Panel::Policies => self.policies.items.is_empty() && !self.policies.loading,
            Panel::Benchmarks => self.benchmarks.items.is_empty() && !self.benchmarks.loading,
            Panel::Settings => !self.settings.loaded && !self.settings.loading,
            Panel::Help => false,
        };
        if needs_load {
            self.reload(panel);
        }
    }

    pub fn next_page(&mut self, panel: Panel) {
        let req = match panel {
            Panel::Devboxes => self.devboxes.list.pager.advance(),
            Panel::Blueprints => self.blueprints.pager.advance(),
            Panel::Snapshots => self.snapshots.pager.advance(),
            Panel::Objects => self.objects.pager.advance(),
            Panel::Policies => self.policies.pager.advance(),
            Panel::Benchmarks => self.benchmarks.pager.advance(),
            Panel::Settings | Panel::Help => None,
        };
        match req {
            Some(req) => self.dispatch_page(panel, req),
            None => self.set_status("No more pages"),
        }
    }

    pub fn prev_page(&mut self, panel: Panel) {
        let req = match panel {
            Panel::Devboxes => self.devboxes.list.pager.retreat(),
            Panel::Blueprints => self.blueprints.pager.retreat(),
            Panel::Snapshots => self.snapshots.pager.retreat(),
            Panel::Objects => self.objects.pager.retreat(),
            Panel::Policies => self.policies.pager.retreat(),
            Panel::Benchmarks => self.benchmarks.pager.retreat(),
            Panel::Settings | Panel::Help => None,
        };
        match req {
            Some(req) => self.dispatch_page(panel, req),
            None => self.set_status("Already on the first page"),
        }
    }

    fn dispatch_page(&mut self, panel: Panel, req: crate::pager::PageRequest) {
        match panel {
            Panel::Devboxes => {
                self.devboxes.list.loading = true;
                self.send(WorkerCommand::LoadDevboxes {
                    req,
                    status: self.devboxes.status_filter,
                });
            }
            Panel::Blueprints => {
                self.blueprints.loading = true;
                self.send(WorkerCommand::LoadBlueprints { req });
            }
            Panel::Snapshots => {
                self.snapshots.loading = true;
                self.send(WorkerCommand::LoadSnapshots { req });
            }
            Panel::Objects => {
                self.objects.loading = true;
                self.send(WorkerCommand::LoadObjects { req });
            }
            Panel::Policies => {
                self.policies.loading = true;
                self.send(WorkerCommand::LoadPolicies { req });
            }
            Panel::Benchmarks => {
                self.benchmarks.loading = true;
                self.send(WorkerCommand::LoadBenchmarks { req });
            }
            Panel::Settings | Panel::Help => {}
        }
    }

    /// Id of the selected row on the active panel, for clipboard/browser.
    pub fn selected_id(&self) -> Option<String> {
        match self.active_panel {
            Panel::Devboxes => self.devboxes.list.selected().map(|d| d.id.clone()),
            Panel::Blueprints => self.blueprints.selected().map(|b| b.id.clone()),
            Panel::Snapshots => self.snapshots.selected().map(|s| s.id.clone()),
            Panel::Objects => self.objects.selected().map(|o| o.id.clone()),
            Panel::Policies => self.policies.selected().map(|p| p.id.clone()),
            Panel::Benchmarks => self.benchmarks.selected().map(|j| j.id.clone()),
            Panel::Settings => {
                let s = &self.settings;
                if s.cursor < s.mcp.len() {
                    s.mcp.get(s.cursor).map(|m| m.id.clone())
                } else {
                    s.gateways.get(s.cursor - s.mcp.len()).map(|g| g.id.clone())
                }
            }
            Panel::Help => None,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > 50 {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn test_app() -> AppState {
        let (tx, _rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        AppState::new(
            tx,
            rx2,
            Arc::new(AtomicBool::new(false)),
            "https://app.devlab.run".into(),
            PathBuf::from("."),
        )
    }

    fn devbox(id: &str) -> Devbox {
        serde_json::from_str(&format!(r#"{{"id": "{id}", "status": "running"}}"#)).unwrap()
    }

    #[test]
    fn panel_cycle() {
        assert_eq!(Panel::Devboxes.next(), Panel::Blueprints);
        assert_eq!(Panel::Help.next(), Panel::Devboxes);
        assert_eq!(Panel::Devboxes.prev(), Panel::Help);
        for i in 0..Panel::COUNT {
            assert_eq!(Panel::from_index(i).unwrap().index(), i);
        }
        assert!(Panel::from_index(Panel::COUNT).is_none());
    }

    #[test]
    fn error_history_caps_at_50() {
        let mut app = test_app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Other, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }

    #[test]
    fn list_pane_cursor_clamped_by_new_page() {
        let mut pane: ListPane<Devbox> = ListPane::new(10);
        pane.apply_page(vec![devbox("a"), devbox("b"), devbox("c")], false, None, None);
        pane.select_last();
        assert_eq!(pane.cursor, 2);

        pane.apply_page(vec![devbox("a")], false, None, None);
        assert_eq!(pane.cursor, 0);

        pane.apply_page(Vec::new(), false, None, None);
        assert_eq!(pane.cursor, 0);
        assert!(pane.selected().is_none());
    }

    #[test]
    fn status_filter_cycles_back_to_all() {
        let mut pane = DevboxPane::new(10);
        assert!(pane.status_filter.is_none());
        let mut seen = Vec::new();
        for _ in 0..DevboxStatus::FILTERABLE.len() {
            pane.cycle_filter();
            seen.push(pane.status_filter);
        }
        assert_eq!(seen[0], Some(DevboxStatus::Running));
        pane.cycle_filter();
        assert!(pane.status_filter.is_none());
    }

    #[test]
    fn create_form_parses_env_vars() {
        let mut form = CreateForm::default();
        form.fields[0] = "web".into();
        form.fields[1] = "bpt_1".into();
        form.fields[4] = "A=1, B=two".into();
        let req = form.to_request().unwrap();
        assert_eq!(req.name.as_deref(), Some("web"));
        assert_eq!(req.blueprint_id.as_deref(), Some("bpt_1"));
        let vars = req.environment_variables.unwrap();
        assert_eq!(vars["A"], "1");
        assert_eq!(vars["B"], "two");
    }

    #[test]
    fn create_form_rejects_bad_env_and_double_source() {
        let mut form = CreateForm::default();
        form.fields[4] = "notakv".into();
        assert!(form.to_request().is_err());

        let mut form = CreateForm::default();
        form.fields[1] = "bpt_1".into();
        form.fields[2] = "snp_1".into();
        assert!(form.to_request().is_err());
    }

    #[test]
    fn settings_selected_id_spans_both_lists() {
        let mut app = test_app();
        app.active_panel = Panel::Settings;
        app.settings.mcp = vec![serde_json::from_str(
            r#"{"id": "mcp_1", "name": "m", "url": "https://x"}"#,
        )
        .unwrap()];
        app.settings.gateways = vec![serde_json::from_str(
            r#"{"id": "gw_1", "name": "g", "endpoint": "https://y"}"#,
        )
        .unwrap()];

        app.settings.cursor = 0;
        assert_eq!(app.selected_id().as_deref(), Some("mcp_1"));
        app.settings.cursor = 1;
        assert_eq!(app.selected_id().as_deref(), Some("gw_1"));
    }
}
