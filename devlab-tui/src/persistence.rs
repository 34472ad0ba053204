//! UI state persistence — JSON save/load across restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use devlab_core::types::DevboxStatus;

use crate::app::{AppState, Panel, DEFAULT_PAGE_SIZE};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedState {
    pub active_panel: Panel,
    pub page_size: u32,
    pub devbox_status_filter: Option<DevboxStatus>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            active_panel: Panel::Devboxes,
            page_size: DEFAULT_PAGE_SIZE,
            devbox_status_filter: None,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        active_panel: app.active_panel,
        page_size: app.devboxes.list.pager.limit(),
        devbox_status_filter: app.devboxes.status_filter,
    }
}

/// Apply persisted state to AppState.
pub fn apply(app: &mut AppState, state: PersistedState) {
    app.active_panel = state.active_panel;
    app.devboxes.status_filter = state.devbox_status_filter;
    let limit = state.page_size.clamp(1, 100);
    app.devboxes.list.pager.set_limit(limit);
    app.blueprints.pager.set_limit(limit);
    app.snapshots.pager.set_limit(limit);
    app.objects.pager.set_limit(limit);
    app.policies.pager.set_limit(limit);
    app.benchmarks.pager.set_limit(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = PersistedState {
            active_panel: Panel::Objects,
            page_size: 50,
            devbox_status_filter: Some(DevboxStatus::Running),
        };

        save(&path, &state).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded.active_panel, Panel::Objects);
        assert_eq!(loaded.page_size, 50);
        assert_eq!(loaded.devbox_status_filter, Some(DevboxStatus::Running));
    }

    #[test]
    fn missing_file_returns_defaults() {
        let loaded = load(Path::new("/nonexistent/path/state.json"));
        assert_eq!(loaded.active_panel, Panel::Devboxes);
        assert_eq!(loaded.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not valid json {{{").unwrap();

        let loaded = load(&path);
        assert_eq!(loaded.active_panel, Panel::Devboxes);
    }
}
