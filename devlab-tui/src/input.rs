//! Keyboard input dispatch — overlays first, then global keys, then the
//! active panel's handler.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, ExecState, Overlay, Panel};
use crate::logs::LogView;
use crate::platform;
use crate::worker::{DevboxAction, WorkerCommand};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::Detail => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.overlay = Overlay::None;
            }
            return;
        }
        Overlay::Logs => {
            handle_logs_overlay(app, key);
            return;
        }
        Overlay::Exec => {
            handle_exec_overlay(app, key);
            return;
        }
        Overlay::Create => {
            handle_create_overlay(app, key);
            return;
        }
        Overlay::ConfirmShutdown { id } => {
            let id = id.clone();
            handle_confirm_overlay(app, key, id);
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='8') => {
            let idx = c as usize - '1' as usize;
            if let Some(panel) = Panel::from_index(idx) {
                app.activate_panel(panel);
            }
            return;
        }
        KeyCode::Tab => {
            let next = if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel.prev()
            } else {
                app.active_panel.next()
            };
            app.activate_panel(next);
            return;
        }
        KeyCode::BackTab => {
            let prev = app.active_panel.prev();
            app.activate_panel(prev);
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('r') => {
            app.reload(app.active_panel);
            return;
        }
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::Devboxes => handle_devboxes_key(app, key),
        Panel::Blueprints => handle_blueprints_key(app, key),
        Panel::Snapshots => handle_plain_list_key(app, key, Panel::Snapshots),
        Panel::Objects => handle_plain_list_key(app, key, Panel::Objects),
        Panel::Policies => handle_plain_list_key(app, key, Panel::Policies),
        Panel::Benchmarks => handle_plain_list_key(app, key, Panel::Benchmarks),
        Panel::Settings => handle_settings_key(app, key),
        Panel::Help => {}
    }
}

// ---------------------------------------------------------------------------
// Overlays

fn handle_logs_overlay(app: &mut AppState, key: KeyEvent) {
    let Some(view) = app.log_view.as_mut() else {
        app.overlay = Overlay::None;
        return;
    };
    let page = view.page_height();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.cancel_worker_loop();
            app.overlay = Overlay::None;
            app.log_view = None;
        }
        KeyCode::Char('j') | KeyCode::Down => view.scroll_down(1, page),
        KeyCode::Char('k') | KeyCode::Up => view.scroll_up(1),
        KeyCode::PageDown => view.scroll_down(page, page),
        KeyCode::PageUp => view.scroll_up(page),
        KeyCode::Char('G') | KeyCode::End => view.jump_to_tail(),
        _ => {}
    }
}

fn handle_exec_overlay(app: &mut AppState, key: KeyEvent) {
    let Some(exec) = app.exec.as_mut() else {
        app.overlay = Overlay::None;
        return;
    };

    if exec.running {
        // Command is in flight; only allow detaching.
        if matches!(key.code, KeyCode::Esc) {
            app.cancel_worker_loop();
            app.overlay = Overlay::None;
            app.exec = None;
            app.set_warning("Stopped watching; command keeps running remotely");
        }
        return;
    }

    if exec.result.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            app.overlay = Overlay::None;
            app.exec = None;
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.exec = None;
        }
        KeyCode::Enter => {
            let command = exec.input.trim().to_string();
            if command.is_empty() {
                return;
            }
            exec.running = true;
            let devbox_id = exec.devbox_id.clone();
            app.send(WorkerCommand::Exec { devbox_id, command });
        }
        KeyCode::Backspace => {
            exec.input.pop();
        }
        KeyCode::Char(c) => {
            exec.input.push(c);
        }
        _ => {}
    }
}

fn handle_create_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.form = Default::default();
        }
        KeyCode::Tab | KeyCode::Down => app.form.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form.prev_field(),
        KeyCode::Enter => match app.form.to_request() {
            Ok(req) => {
                app.form.submitting = true;
                app.send(WorkerCommand::CreateDevbox { req: Box::new(req) });
                app.overlay = Overlay::None;
                app.form = Default::default();
                app.set_status("Creating devbox...");
            }
            Err(msg) => app.set_warning(msg),
        },
        KeyCode::Backspace => {
            let field = &mut app.form.fields[app.form.active];
            field.pop();
        }
        KeyCode::Char(c) => {
            app.form.fields[app.form.active].push(c);
        }
        _ => {}
    }
}

fn handle_confirm_overlay(app: &mut AppState, key: KeyEvent, id: String) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            app.send(WorkerCommand::DevboxAction {
                id,
                action: DevboxAction::Shutdown,
            });
            app.overlay = Overlay::None;
        }
        KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
            app.overlay = Overlay::None;
        }
        _ => {}
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Panels

fn handle_devboxes_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.devboxes.list.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.devboxes.list.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.devboxes.list.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.devboxes.list.select_last(),
        KeyCode::Char('n') => app.next_page(Panel::Devboxes),
        KeyCode::Char('p') => app.prev_page(Panel::Devboxes),
        KeyCode::Enter => {
            if app.devboxes.list.selected().is_some() {
                app.overlay = Overlay::Detail;
            }
        }
        KeyCode::Char('s') => {
            app.devboxes.cycle_filter();
            app.devboxes.list.pager.reset();
            let label = app
                .devboxes
                .status_filter
                .map(|s| s.as_str())
                .unwrap_or("all");
            app.set_status(format!("Filter: {label}"));
            app.reload(Panel::Devboxes);
        }
        KeyCode::Char('u') => devbox_action(app, DevboxAction::Suspend),
        KeyCode::Char('m') => devbox_action(app, DevboxAction::Resume),
        KeyCode::Char('S') => {
            if let Some(devbox) = app.devboxes.list.selected() {
                app.overlay = Overlay::ConfirmShutdown {
                    id: devbox.id.clone(),
                };
            }
        }
        KeyCode::Char('t') => devbox_action(app, DevboxAction::Snapshot),
        KeyCode::Char('l') => {
            if let Some(devbox) = app.devboxes.list.selected() {
                let id = devbox.id.clone();
                app.log_view = Some(LogView::new(format!("devbox {id}")));
                app.overlay = Overlay::Logs;
                app.send(WorkerCommand::TailLogs { devbox_id: id });
            }
        }
        KeyCode::Char('x') => {
            if let Some(devbox) = app.devboxes.list.selected() {
                app.exec = Some(ExecState::new(devbox.id.clone()));
                app.overlay = Overlay::Exec;
            }
        }
        KeyCode::Char('c') => {
            app.form = Default::default();
            app.overlay = Overlay::Create;
        }
        KeyCode::Char('y') => yank_selected(app),
        KeyCode::Char('o') => open_selected(app),
        _ => {}
    }
}

fn handle_blueprints_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.blueprints.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.blueprints.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.blueprints.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.blueprints.select_last(),
        KeyCode::Char('n') => app.next_page(Panel::Blueprints),
        KeyCode::Char('p') => app.prev_page(Panel::Blueprints),
        KeyCode::Enter => {
            if app.blueprints.selected().is_some() {
                app.overlay = Overlay::Detail;
            }
        }
        KeyCode::Char('l') => {
            if let Some(blueprint) = app.blueprints.selected() {
                let id = blueprint.id.clone();
                app.log_view = Some(LogView::new(format!("blueprint {id}")));
                app.overlay = Overlay::Logs;
                app.send(WorkerCommand::FetchBlueprintLogs { id });
            }
        }
        KeyCode::Char('y') => yank_selected(app),
        KeyCode::Char('o') => open_selected(app),
        _ => {}
    }
}

/// Shared handler for panels with no resource-specific actions.
fn handle_plain_list_key(app: &mut AppState, key: KeyEvent, panel: Panel) {
    // The panes have different item types, so dispatch per panel.
    macro_rules! nav {
        ($pane:expr) => {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => $pane.select_next(),
                KeyCode::Char('k') | KeyCode::Up => $pane.select_prev(),
                KeyCode::Char('g') | KeyCode::Home => $pane.select_first(),
                KeyCode::Char('G') | KeyCode::End => $pane.select_last(),
                KeyCode::Char('n') => app.next_page(panel),
                KeyCode::Char('p') => app.prev_page(panel),
                KeyCode::Enter => {
                    if $pane.selected().is_some() {
                        app.overlay = Overlay::Detail;
                    }
                }
                KeyCode::Char('y') => yank_selected(app),
                KeyCode::Char('o') => open_selected(app),
                _ => {}
            }
        };
    }
    match panel {
        Panel::Snapshots => nav!(app.snapshots),
        Panel::Objects => nav!(app.objects),
        Panel::Policies => nav!(app.policies),
        Panel::Benchmarks => nav!(app.benchmarks),
        _ => {}
    }
}

fn handle_settings_key(app: &mut AppState, key: KeyEvent) {
    let rows = app.settings.row_count();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if rows > 0 && app.settings.cursor + 1 < rows {
                app.settings.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.settings.cursor = app.settings.cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            if rows > 0 {
                app.overlay = Overlay::Detail;
            }
        }
        KeyCode::Char('y') => yank_selected(app),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Clipboard / browser

fn yank_selected(app: &mut AppState) {
    let Some(id) = app.selected_id() else {
        return;
    };
    match platform::copy_to_clipboard(&id) {
        Ok(()) => app.set_status(format!("Copied {id}")),
        Err(e) => app.set_warning(format!("Clipboard failed: {e}")),
    }
}

fn open_selected(app: &mut AppState) {
    let Some(path) = dashboard_path(app.active_panel) else {
        return;
    };
    let Some(id) = app.selected_id() else {
        return;
    };
    let url = format!("{}/{path}/{id}", app.dashboard_url);
    match platform::open_in_browser(&url) {
        Ok(()) => app.set_status(format!("Opened {url}")),
        Err(e) => app.set_warning(format!("Browser failed: {e}")),
    }
}

fn dashboard_path(panel: Panel) -> Option<&'static str> {
    match panel {
        Panel::Devboxes => Some("devboxes"),
        Panel::Blueprints => Some("blueprints"),
        Panel::Snapshots => Some("snapshots"),
        Panel::Objects => Some("objects"),
        Panel::Policies => Some("network-policies"),
        Panel::Benchmarks => Some("benchmarks"),
        Panel::Settings | Panel::Help => None,
    }
}

fn devbox_action(app: &mut AppState, action: DevboxAction) {
    if let Some(devbox) = app.devboxes.list.selected() {
        app.send(WorkerCommand::DevboxAction {
            id: devbox.id.clone(),
            action,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Panel;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn test_app() -> (AppState, mpsc::Receiver<WorkerCommand>) {
        let (tx, cmd_rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        let app = AppState::new(
            tx,
            rx2,
            Arc::new(AtomicBool::new(false)),
            "https://app.devlab.run".into(),
            PathBuf::from("."),
        );
        (app, cmd_rx)
    }

    fn devboxes(n: usize) -> Vec<devlab_core::types::Devbox> {
        (0..n)
            .map(|i| {
                serde_json::from_str(&format!(r#"{{"id": "dbx_{i}", "status": "running"}}"#))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn quit_on_q_and_ctrl_c() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('q')));
        assert!(!app.running);

        let (mut app, _rx) = test_app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!app.running);
    }

    #[test]
    fn digit_keys_switch_panels() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('2')));
        assert_eq!(app.active_panel, Panel::Blueprints);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('8')));
        assert_eq!(app.active_panel, Panel::Help);
    }

    #[test]
    fn tab_cycles_panels() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, KeyEvent::from(KeyCode::Tab));
        assert_eq!(app.active_panel, Panel::Blueprints);
        handle_key(&mut app, KeyEvent::from(KeyCode::BackTab));
        assert_eq!(app.active_panel, Panel::Devboxes);
    }

    #[test]
    fn vim_navigation_moves_cursor() {
        let (mut app, _rx) = test_app();
        app.devboxes.list.apply_page(devboxes(5), false, None, None);

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('j')));
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('j')));
        assert_eq!(app.devboxes.list.cursor, 2);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('k')));
        assert_eq!(app.devboxes.list.cursor, 1);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('G')));
        assert_eq!(app.devboxes.list.cursor, 4);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('g')));
        assert_eq!(app.devboxes.list.cursor, 0);
    }

    #[test]
    fn next_page_sends_load_command() {
        let (mut app, rx) = test_app();
        app.devboxes
            .list
            .apply_page(devboxes(3), true, Some("dbx_2".into()), Some(9));

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('n')));
        match rx.try_recv().unwrap() {
            WorkerCommand::LoadDevboxes { req, .. } => {
                assert_eq!(req.starting_after.as_deref(), Some("dbx_2"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(app.devboxes.list.loading);
    }

    #[test]
    fn enter_opens_detail_only_with_selection() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, KeyEvent::from(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::None);

        app.devboxes.list.apply_page(devboxes(1), false, None, None);
        handle_key(&mut app, KeyEvent::from(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::Detail);
    }

    #[test]
    fn shutdown_requires_confirmation() {
        let (mut app, rx) = test_app();
        app.devboxes.list.apply_page(devboxes(1), false, None, None);

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('S')));
        assert!(matches!(app.overlay, Overlay::ConfirmShutdown { .. }));
        assert!(rx.try_recv().is_err());

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('y')));
        assert_eq!(app.overlay, Overlay::None);
        match rx.try_recv().unwrap() {
            WorkerCommand::DevboxAction { id, action } => {
                assert_eq!(id, "dbx_0");
                assert_eq!(action, DevboxAction::Shutdown);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn confirm_declines_on_n() {
        let (mut app, rx) = test_app();
        app.devboxes.list.apply_page(devboxes(1), false, None, None);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('S')));
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('n')));
        assert_eq!(app.overlay, Overlay::None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn filter_cycle_resets_pager_and_reloads() {
        let (mut app, rx) = test_app();
        app.devboxes
            .list
            .apply_page(devboxes(3), true, Some("dbx_2".into()), None);
        app.devboxes.list.pager.advance().unwrap();

        handle_key(&mut app, KeyEvent::from(KeyCode::Char('s')));
        assert_eq!(app.devboxes.list.pager.page_number(), 1);
        match rx.try_recv().unwrap() {
            WorkerCommand::LoadDevboxes { req, status } => {
                assert_eq!(req.starting_after, None);
                assert_eq!(status, Some(devlab_core::types::DevboxStatus::Running));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn logs_key_starts_tail() {
        let (mut app, rx) = test_app();
        app.devboxes.list.apply_page(devboxes(1), false, None, None);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('l')));
        assert_eq!(app.overlay, Overlay::Logs);
        assert!(app.log_view.is_some());
        assert!(matches!(
            rx.try_recv().unwrap(),
            WorkerCommand::TailLogs { .. }
        ));
    }

    #[test]
    fn exec_overlay_submits_on_enter() {
        let (mut app, rx) = test_app();
        app.devboxes.list.apply_page(devboxes(1), false, None, None);
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('x')));
        assert_eq!(app.overlay, Overlay::Exec);

        for c in "uname -a".chars() {
            handle_key(&mut app, KeyEvent::from(KeyCode::Char(c)));
        }
        handle_key(&mut app, KeyEvent::from(KeyCode::Enter));
        match rx.try_recv().unwrap() {
            WorkerCommand::Exec { devbox_id, command } => {
                assert_eq!(devbox_id, "dbx_0");
                assert_eq!(command, "uname -a");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(app.exec.as_ref().unwrap().running);
    }

    #[test]
    fn create_form_tab_cycles_fields() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, KeyEvent::from(KeyCode::Char('c')));
        assert_eq!(app.overlay, Overlay::Create);
        handle_key(&mut app, KeyEvent::from(KeyCode::Tab));
        assert_eq!(app.form.active, 1);
        handle_key(&mut app, KeyEvent::from(KeyCode::BackTab));
        assert_eq!(app.form.active, 0);
    }

    #[test]
    fn closing_logs_overlay_cancels_worker_loop() {
        let (mut app, _rx) = test_app();
        app.log_view = Some(LogView::new("devbox dbx_0"));
        app.overlay = Overlay::Logs;
        handle_key(&mut app, KeyEvent::from(KeyCode::Esc));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.cancel.load(std::sync::atomic::Ordering::Relaxed));
        assert!(app.log_view.is_none());
    }
}
