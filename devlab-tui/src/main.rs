//! devlab TUI — panel-per-resource terminal interface.
//!
//! Panels:
//! 1. Devboxes — paged table, lifecycle actions, logs, exec, create form
//! 2. Blueprints — paged table, build logs
//! 3. Snapshots — disk snapshots across devboxes
//! 4. Objects — storage objects
//! 5. Policies — network egress policies
//! 6. Benchmarks — benchmark job runs
//! 7. Settings — MCP and gateway configurations
//! 8. Help — keyboard shortcuts

mod app;
mod detail;
mod input;
mod logs;
mod pager;
mod persistence;
mod platform;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use devlab_core::Config;

use crate::app::{AppState, ErrorCategory};
use crate::logs::TailSource;
use crate::worker::{WorkerCommand, WorkerResponse};

fn main() -> Result<()> {
    // Resolve config before touching the terminal so a missing API key is a
    // plain error message, not a corrupted screen.
    let config = Config::from_env()?;

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let state_path = devlab_core::config::state_dir().join("tui_state.json");
    let persisted = persistence::load(&state_path);

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let worker_handle = worker::spawn_worker(config.clone(), cmd_rx, resp_tx, cancel.clone());

    let mut app = AppState::new(
        cmd_tx.clone(),
        resp_rx,
        cancel.clone(),
        config.dashboard_url.clone(),
        state_path.clone(),
    );
    persistence::apply(&mut app, persisted);

    // Kick off the first page load for the restored panel.
    app.reload(app.active_panel);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    let persisted = persistence::extract(&app);
    let _ = persistence::save(&state_path, &persisted);

    // Shutdown worker
    app.cancel_worker_loop();
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Re-request the current page of the active panel at this interval. The
/// pager's refresh() keeps the cursor stack intact.
const AUTO_REFRESH: Duration = Duration::from_secs(30);

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
                last_refresh = Instant::now();
            }
        }

        // 4. Periodic list refresh while idle. Overlays pause it so a log
        //    tail or form never competes with page loads on the worker.
        if last_refresh.elapsed() >= AUTO_REFRESH && app.overlay == app::Overlay::None {
            app.reload(app.active_panel);
            last_refresh = Instant::now();
        }

        // 5. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::DevboxPage {
            items,
            has_more,
            next_cursor,
            total,
        } => {
            app.devboxes
                .list
                .apply_page(items, has_more, next_cursor, total);
        }
        WorkerResponse::BlueprintPage {
            items,
            has_more,
            next_cursor,
            total,
        } => {
            app.blueprints.apply_page(items, has_more, next_cursor, total);
        }
        WorkerResponse::SnapshotPage {
            items,
            has_more,
            next_cursor,
            total,
        } => {
            app.snapshots.apply_page(items, has_more, next_cursor, total);
        }
        WorkerResponse::ObjectPage {
            items,
            has_more,
            next_cursor,
            total,
        } => {
            app.objects.apply_page(items, has_more, next_cursor, total);
        }
        WorkerResponse::PolicyPage {
            items,
            has_more,
            next_cursor,
            total,
        } => {
            app.policies.apply_page(items, has_more, next_cursor, total);
        }
        WorkerResponse::BenchmarkPage {
            items,
            has_more,
            next_cursor,
            total,
        } => {
            app.benchmarks
                .apply_page(items, has_more, next_cursor, total);
        }
        WorkerResponse::SettingsLoaded { mcp, gateways } => {
            app.settings.mcp = mcp;
            app.settings.gateways = gateways;
            app.settings.loading = false;
            app.settings.loaded = true;
            app.settings.cursor = app
                .settings
                .cursor
                .min(app.settings.row_count().saturating_sub(1));
        }
        WorkerResponse::ActionDone { message } => {
            app.form.submitting = false;
            app.set_status(message);
            // Lifecycle changes show up on the devboxes page; refresh it.
            app.reload(app::Panel::Devboxes);
        }
        WorkerResponse::LogBatch { lines } => {
            if let Some(view) = app.log_view.as_mut() {
                view.push_entries(&lines);
            }
        }
        WorkerResponse::LogTailStatus { streaming } => {
            if let Some(view) = app.log_view.as_mut() {
                view.source = if streaming {
                    TailSource::Streaming
                } else {
                    TailSource::Polling
                };
            }
        }
        WorkerResponse::LogTailEnded => {
            if let Some(view) = app.log_view.as_mut() {
                view.source = TailSource::Ended;
            }
        }
        WorkerResponse::ExecUpdate { execution } => {
            if let Some(exec) = app.exec.as_mut() {
                exec.result = Some(*execution);
            }
        }
        WorkerResponse::ExecDone { execution } => {
            let summary = match execution.exit_status {
                Some(code) => format!("Command finished with exit_status={code}"),
                None => "Command finished".to_string(),
            };
            if let Some(exec) = app.exec.as_mut() {
                exec.running = false;
                exec.result = Some(*execution);
            }
            app.set_status(summary);
        }
        WorkerResponse::Error {
            category,
            message,
            context,
        } => {
            clear_loading(app);
            app.push_error(ErrorCategory::from_tag(&category), message, context);
        }
    }
}

/// A failed call must not leave a panel stuck in "loading".
fn clear_loading(app: &mut AppState) {
    app.devboxes.list.loading = false;
    app.blueprints.loading = false;
    app.snapshots.loading = false;
    app.objects.loading = false;
    app.policies.loading = false;
    app.benchmarks.loading = false;
    app.settings.loading = false;
    app.form.submitting = false;
    if let Some(exec) = app.exec.as_mut() {
        exec.running = false;
    }
}
