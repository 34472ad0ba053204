//! Style tokens — neon accents on a dark terminal background.
//!
//! Panels never construct colors directly; everything routes through these
//! helpers so status coloring stays consistent across tables, detail
//! overlays, and the status bar.

use ratatui::style::{Color, Modifier, Style};

use devlab_core::types::{
    BlueprintStatus, DevboxStatus, ExecutionStatus, JobStatus, ObjectState, SnapshotStatus,
};

const ACCENT: Color = Color::Rgb(0, 255, 255);
const POSITIVE: Color = Color::Rgb(0, 255, 128);
const NEGATIVE: Color = Color::Rgb(255, 20, 147);
const WARNING: Color = Color::Rgb(255, 140, 0);
const NEUTRAL: Color = Color::Rgb(147, 112, 219);
const MUTED: Color = Color::Rgb(100, 149, 237);
const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Cursor row highlight.
pub fn cursor(base: Style) -> Style {
    base.add_modifier(Modifier::REVERSED)
}

pub fn devbox_status(status: DevboxStatus) -> Style {
    match status {
        DevboxStatus::Running => positive(),
        DevboxStatus::Failure => negative(),
        DevboxStatus::Suspended | DevboxStatus::Suspending => warning(),
        DevboxStatus::Provisioning | DevboxStatus::Initializing | DevboxStatus::Resuming => {
            neutral()
        }
        DevboxStatus::Shutdown | DevboxStatus::Unknown => muted(),
    }
}

pub fn blueprint_status(status: BlueprintStatus) -> Style {
    match status {
        BlueprintStatus::BuildComplete => positive(),
        BlueprintStatus::Failed => negative(),
        BlueprintStatus::Provisioning | BlueprintStatus::Building => neutral(),
        BlueprintStatus::Unknown => muted(),
    }
}

pub fn snapshot_status(status: SnapshotStatus) -> Style {
    match status {
        SnapshotStatus::Complete => positive(),
        SnapshotStatus::Error => negative(),
        SnapshotStatus::InProgress => neutral(),
        SnapshotStatus::Unknown => muted(),
    }
}

pub fn object_state(state: ObjectState) -> Style {
    match state {
        ObjectState::ReadOnly => positive(),
        ObjectState::Deleted => negative(),
        ObjectState::Uploading => neutral(),
        ObjectState::Unknown => muted(),
    }
}

pub fn job_status(status: JobStatus) -> Style {
    match status {
        JobStatus::Completed => positive(),
        JobStatus::Failed => negative(),
        JobStatus::Canceled => warning(),
        JobStatus::Queued | JobStatus::Running => neutral(),
        JobStatus::Unknown => muted(),
    }
}

pub fn execution_status(status: ExecutionStatus) -> Style {
    match status {
        ExecutionStatus::Completed => positive(),
        ExecutionStatus::Queued | ExecutionStatus::Running => neutral(),
        ExecutionStatus::Unknown => muted(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_is_positive_and_failure_negative() {
        assert_eq!(devbox_status(DevboxStatus::Running), positive());
        assert_eq!(devbox_status(DevboxStatus::Failure), negative());
        assert_eq!(devbox_status(DevboxStatus::Suspended), warning());
    }

    #[test]
    fn border_tracks_focus() {
        assert_eq!(panel_border(true), accent());
        assert_eq!(panel_border(false), muted());
    }
}
