use owo_colors::OwoColorize;

pub mod data_formatting;
pub mod tables;

pub use data_formatting::*;
pub use tables::{Tabulate, render_table};

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Active,
    Inactive,
    Draft,
}

/// Human label and tone for a backend status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: String,
    pub tone: StatusTone,
}

/// Map a raw status such as `LIVE` to its badge. Unknown values keep their
/// raw text and read as drafts.
pub fn map_status(status: &str) -> StatusBadge {
    let (label, tone) = match status {
        "LIVE" => ("Active", StatusTone::Active),
        "DRAFT" => ("Draft", StatusTone::Draft),
        "PAUSED" => ("Paused", StatusTone::Inactive),
        "CONCLUDED" => ("Concluded", StatusTone::Inactive),
        "TERMINATED" => ("Terminated", StatusTone::Inactive),
        other => (other, StatusTone::Draft),
    };
    StatusBadge {
        label: label.to_string(),
        tone,
    }
}

pub fn format_status_colored(status: &str) -> String {
    let badge = map_status(status);
    let text = format!("[{}]", badge.label);
    match badge.tone {
        StatusTone::Active => text.green().to_string(),
        StatusTone::Inactive => text.dimmed().to_string(),
        StatusTone::Draft => text.yellow().to_string(),
    }
}
