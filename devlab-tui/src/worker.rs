//! Background worker thread — every API call runs here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The
//! worker is strictly sequential: one command at a time, long-running
//! loops (log tails, exec polling) interruptible through the shared
//! cancel flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use devlab_core::types::{
    BenchmarkJob, Blueprint, Devbox, DevboxCreateRequest, DevboxStatus, DiskSnapshot, Execution,
    ExecutionStatus, GatewayConfig, LogEntry, McpConfig, NetworkPolicy, StorageObject,
};
use devlab_core::{ApiError, Config, DevlabClient, ListQuery, Page};

use crate::pager::PageRequest;

const LOG_POLL_INTERVAL: Duration = Duration::from_secs(2);
const EXEC_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CANCEL_SLICE: Duration = Duration::from_millis(100);

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    LoadDevboxes {
        req: PageRequest,
        status: Option<DevboxStatus>,
    },
    LoadBlueprints { req: PageRequest },
    LoadSnapshots { req: PageRequest },
    LoadObjects { req: PageRequest },
    LoadPolicies { req: PageRequest },
    LoadBenchmarks { req: PageRequest },
    LoadSettings,
    DevboxAction {
        id: String,
        action: DevboxAction,
    },
    CreateDevbox {
        req: Box<DevboxCreateRequest>,
    },
    TailLogs { devbox_id: String },
    FetchBlueprintLogs { id: String },
    Exec {
        devbox_id: String,
        command: String,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevboxAction {
    Suspend,
    Resume,
    Shutdown,
    Snapshot,
}

impl DevboxAction {
    fn label(self) -> &'static str {
        match self {
            DevboxAction::Suspend => "suspend",
            DevboxAction::Resume => "resume",
            DevboxAction::Shutdown => "shutdown",
            DevboxAction::Snapshot => "snapshot",
        }
    }
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    DevboxPage {
        items: Vec<Devbox>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    },
    BlueprintPage {
        items: Vec<Blueprint>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    },
    SnapshotPage {
        items: Vec<DiskSnapshot>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    },
    ObjectPage {
        items: Vec<StorageObject>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    },
    PolicyPage {
        items: Vec<NetworkPolicy>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    },
    BenchmarkPage {
        items: Vec<BenchmarkJob>,
        has_more: bool,
        next_cursor: Option<String>,
        total: Option<u64>,
    },
    SettingsLoaded {
        mcp: Vec<McpConfig>,
        gateways: Vec<GatewayConfig>,
    },
    /// A lifecycle action or create finished; the panel should refresh.
    ActionDone {
        message: String,
    },
    LogBatch {
        lines: Vec<LogEntry>,
    },
    /// Tail transport changed: true = live stream, false = polling fallback.
    LogTailStatus {
        streaming: bool,
    },
    LogTailEnded,
    ExecUpdate {
        execution: Box<Execution>,
    },
    ExecDone {
        execution: Box<Execution>,
    },
    Error {
        category: String,
        message: String,
        context: String,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    config: Config,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("devlab-worker".into())
        .spawn(move || {
            worker_loop(config, rx, tx, cancel);
        })
        .expect("failed to spawn worker thread")
}

fn worker_loop(
    config: Config,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) {
    let client = match DevlabClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            send_error(&tx, &e, "client setup");
            return;
        }
    };

    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                cancel.store(false, Ordering::Relaxed);
                handle_command(&client, cmd, &tx, &cancel);
            }
        }
    }
}

fn handle_command(
    client: &DevlabClient,
    cmd: WorkerCommand,
    tx: &Sender<WorkerResponse>,
    cancel: &Arc<AtomicBool>,
) {
    match cmd {
        WorkerCommand::LoadDevboxes { req, status } => {
            let mut query = query_from(&req);
            if let Some(status) = status {
                query = query.filter("status", status.as_str());
            }
            match client.devboxes().list(&query) {
                Ok(page) => send_page(tx, page, |items, has_more, next_cursor, total| {
                    WorkerResponse::DevboxPage { items, has_more, next_cursor, total }
                }),
                Err(e) => send_error(tx, &e, "list devboxes"),
            }
        }
        WorkerCommand::LoadBlueprints { req } => {
            match client.blueprints().list(&query_from(&req)) {
                Ok(page) => send_page(tx, page, |items, has_more, next_cursor, total| {
                    WorkerResponse::BlueprintPage { items, has_more, next_cursor, total }
                }),
                Err(e) => send_error(tx, &e, "list blueprints"),
            }
        }
        WorkerCommand::LoadSnapshots { req } => {
            match client.devboxes().list_snapshots(&query_from(&req)) {
                Ok(page) => send_page(tx, page, |items, has_more, next_cursor, total| {
                    WorkerResponse::SnapshotPage { items, has_more, next_cursor, total }
                }),
                Err(e) => send_error(tx, &e, "list snapshots"),
            }
        }
        WorkerCommand::LoadObjects { req } => {
            match client.objects().list(&query_from(&req)) {
                Ok(page) => send_page(tx, page, |items, has_more, next_cursor, total| {
                    WorkerResponse::ObjectPage { items, has_more, next_cursor, total }
                }),
                Err(e) => send_error(tx, &e, "list objects"),
            }
        }
        WorkerCommand::LoadPolicies { req } => {
            match client.network_policies().list(&query_from(&req)) {
                Ok(page) => send_page(tx, page, |items, has_more, next_cursor, total| {
                    WorkerResponse::PolicyPage { items, has_more, next_cursor, total }
                }),
                Err(e) => send_error(tx, &e, "list network policies"),
            }
        }
        WorkerCommand::LoadBenchmarks { req } => {
            match client.benchmarks().list_jobs(&query_from(&req)) {
                Ok(page) => send_page(tx, page, |items, has_more, next_cursor, total| {
                    WorkerResponse::BenchmarkPage { items, has_more, next_cursor, total }
                }),
                Err(e) => send_error(tx, &e, "list benchmark jobs"),
            }
        }
        WorkerCommand::LoadSettings => {
            let mcp = match client.mcp_configs().list() {
                Ok(mcp) => mcp,
                Err(e) => {
                    send_error(tx, &e, "list mcp configs");
                    return;
                }
            };
            match client.gateway_configs().list() {
                Ok(gateways) => {
                    let _ = tx.send(WorkerResponse::SettingsLoaded { mcp, gateways });
                }
                Err(e) => send_error(tx, &e, "list gateway configs"),
            }
        }
        WorkerCommand::DevboxAction { id, action } => {
            let devboxes = client.devboxes();
            let result = match action {
                DevboxAction::Suspend => devboxes
                    .suspend(&id)
                    .map(|d| format!("Suspend requested for {}", d.id)),
                DevboxAction::Resume => devboxes
                    .resume(&id)
                    .map(|d| format!("Resume requested for {}", d.id)),
                DevboxAction::Shutdown => devboxes
                    .shutdown(&id)
                    .map(|d| format!("Shutdown requested for {}", d.id)),
                DevboxAction::Snapshot => devboxes
                    .snapshot_disk(&id)
                    .map(|s| format!("Snapshot {} started for {id}", s.id)),
            };
            match result {
                Ok(message) => {
                    let _ = tx.send(WorkerResponse::ActionDone { message });
                }
                Err(e) => send_error(tx, &e, action.label()),
            }
        }
        WorkerCommand::CreateDevbox { req } => match client.devboxes().create(&req) {
            Ok(devbox) => {
                let _ = tx.send(WorkerResponse::ActionDone {
                    message: format!("Created devbox {}", devbox.id),
                });
            }
            Err(e) => send_error(tx, &e, "create devbox"),
        },
        WorkerCommand::TailLogs { devbox_id } => {
            handle_tail(client, &devbox_id, tx, cancel);
        }
        WorkerCommand::FetchBlueprintLogs { id } => {
            match client.blueprints().logs(&id) {
                Ok(lines) => {
                    let _ = tx.send(WorkerResponse::LogBatch { lines });
                }
                Err(e) => send_error(tx, &e, "blueprint logs"),
            }
            let _ = tx.send(WorkerResponse::LogTailEnded);
        }
        WorkerCommand::Exec { devbox_id, command } => {
            handle_exec(client, &devbox_id, &command, tx, cancel);
        }
        WorkerCommand::Shutdown => {} // handled in loop
    }
}

fn query_from(req: &PageRequest) -> ListQuery {
    let mut query = ListQuery::new().limit(req.limit);
    if let Some(cursor) = &req.starting_after {
        query = query.starting_after(cursor.clone());
    }
    query
}

fn send_page<T: devlab_core::Identified>(
    tx: &Sender<WorkerResponse>,
    page: Page<T>,
    build: impl FnOnce(Vec<T>, bool, Option<String>, Option<u64>) -> WorkerResponse,
) {
    let next_cursor = page.next_cursor().map(str::to_string);
    let _ = tx.send(build(page.items, page.has_more, next_cursor, page.total_count));
}

fn send_error(tx: &Sender<WorkerResponse>, err: &ApiError, context: &str) {
    let category = match err {
        ApiError::NetworkUnreachable(_)
        | ApiError::RateLimited { .. }
        | ApiError::CircuitBreakerTripped
        | ApiError::StreamClosed(_) => "network",
        ApiError::Api { .. }
        | ApiError::NotFound { .. }
        | ApiError::AuthenticationFailed => "api",
        ApiError::Decode(_) => "decode",
        _ => "other",
    };
    let _ = tx.send(WorkerResponse::Error {
        category: category.into(),
        message: err.to_string(),
        context: context.into(),
    });
}

/// Sleep in small slices so the cancel flag is observed promptly.
/// Returns true if cancelled.
fn sleep_with_cancel(cancel: &AtomicBool, duration: Duration) -> bool {
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let slice = remaining.min(CANCEL_SLICE);
        thread::sleep(slice);
        remaining -= slice;
    }
    cancel.load(Ordering::Relaxed)
}

/// Follow a devbox's logs: history first, then the streaming tail, then
/// interval polling when the stream fails or closes.
fn handle_tail(
    client: &DevlabClient,
    devbox_id: &str,
    tx: &Sender<WorkerResponse>,
    cancel: &Arc<AtomicBool>,
) {
    let devboxes = client.devboxes();
    let mut last_ts: i64 = 0;

    match devboxes.logs(devbox_id) {
        Ok(lines) => {
            last_ts = max_timestamp(&lines).unwrap_or(0);
            let _ = tx.send(WorkerResponse::LogBatch { lines });
        }
        Err(e) => {
            send_error(tx, &e, devbox_id);
            let _ = tx.send(WorkerResponse::LogTailEnded);
            return;
        }
    }

    match devboxes.tail_logs(devbox_id) {
        Ok(tail) => {
            let _ = tx.send(WorkerResponse::LogTailStatus { streaming: true });
            for entry in tail {
                if cancel.load(Ordering::Relaxed) {
                    let _ = tx.send(WorkerResponse::LogTailEnded);
                    return;
                }
                match entry {
                    Ok(entry) => {
                        if let Some(ts) = entry.timestamp_ms {
                            last_ts = last_ts.max(ts);
                        }
                        let _ = tx.send(WorkerResponse::LogBatch { lines: vec![entry] });
                    }
                    // Stream died mid-flight; drop to polling below.
                    Err(_) => break,
                }
            }
        }
        Err(_) => {}
    }

    let _ = tx.send(WorkerResponse::LogTailStatus { streaming: false });
    loop {
        if sleep_with_cancel(cancel, LOG_POLL_INTERVAL) {
            let _ = tx.send(WorkerResponse::LogTailEnded);
            return;
        }
        match devboxes.logs_since(devbox_id, last_ts) {
            Ok(lines) => {
                if !lines.is_empty() {
                    if let Some(ts) = max_timestamp(&lines) {
                        last_ts = last_ts.max(ts);
                    }
                    let _ = tx.send(WorkerResponse::LogBatch { lines });
                }
            }
            // Network blips keep the poll loop alive.
            Err(e) if e.is_transient() => {}
            Err(e) => {
                send_error(tx, &e, devbox_id);
                let _ = tx.send(WorkerResponse::LogTailEnded);
                return;
            }
        }
    }
}

fn max_timestamp(lines: &[LogEntry]) -> Option<i64> {
    lines.iter().filter_map(|l| l.timestamp_ms).max()
}

/// Start an async execution and poll its status until it completes.
fn handle_exec(
    client: &DevlabClient,
    devbox_id: &str,
    command: &str,
    tx: &Sender<WorkerResponse>,
    cancel: &Arc<AtomicBool>,
) {
    let devboxes = client.devboxes();
    let execution = match devboxes.execute_async(devbox_id, command, None) {
        Ok(execution) => execution,
        Err(e) => {
            send_error(tx, &e, "exec");
            return;
        }
    };
    let execution_id = execution.execution_id.clone();
    let _ = tx.send(WorkerResponse::ExecUpdate {
        execution: Box::new(execution),
    });

    loop {
        if sleep_with_cancel(cancel, EXEC_POLL_INTERVAL) {
            return;
        }
        match devboxes.execution_status(devbox_id, &execution_id) {
            Ok(execution) => {
                if execution.status == ExecutionStatus::Completed {
                    let _ = tx.send(WorkerResponse::ExecDone {
                        execution: Box::new(execution),
                    });
                    return;
                }
                let _ = tx.send(WorkerResponse::ExecUpdate {
                    execution: Box::new(execution),
                });
            }
            Err(e) if e.is_transient() => {}
            Err(e) => {
                send_error(tx, &e, "exec status");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn test_config() -> Config {
        // Never dialed in tests: the worker only connects on command.
        Config {
            api_key: "key_test".into(),
            base_url: "http://127.0.0.1:1".into(),
            ssh_proxy: "ssh.invalid:443".into(),
            dashboard_url: "http://127.0.0.1:1".into(),
        }
    }

    #[test]
    fn worker_shutdown() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let handle = spawn_worker(test_config(), cmd_rx, resp_tx, cancel);
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn worker_exits_when_channel_drops() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let handle = spawn_worker(test_config(), cmd_rx, resp_tx, cancel);
        drop(cmd_tx);
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn sleep_with_cancel_observes_flag() {
        let cancel = AtomicBool::new(true);
        let start = std::time::Instant::now();
        assert!(sleep_with_cancel(&cancel, Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn max_timestamp_ignores_missing() {
        let lines = vec![
            LogEntry {
                timestamp_ms: Some(10),
                source: None,
                level: None,
                message: None,
                cmd: None,
                exit_code: None,
            },
            LogEntry {
                timestamp_ms: None,
                source: None,
                level: None,
                message: None,
                cmd: None,
                exit_code: None,
            },
            LogEntry {
                timestamp_ms: Some(30),
                source: None,
                level: None,
                message: None,
                cmd: None,
                exit_code: None,
            },
        ];
        assert_eq!(max_timestamp(&lines), Some(30));
        assert_eq!(max_timestamp(&[]), None);
    }
}
