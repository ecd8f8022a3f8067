//! Table rows for each record type.

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::types::{AudienceListItem, ConnectorType, Datasink, Datasource};

use super::{
    NOT_AVAILABLE, format_count, format_epoch_date, format_status_colored, map_status, title_case,
    truncate,
};

/// A record that can be shown as one table row and as JSON.
pub trait Tabulate: Serialize {
    type Row: Tabled;

    fn row(&self) -> Self::Row;

    /// One-line summary used by the interactive browser.
    fn summary(&self) -> String;
}

/// Render `records` as a rounded table.
pub fn render_table<T: Tabulate>(records: &[T]) -> String {
    let rows: Vec<T::Row> = records.iter().map(Tabulate::row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

fn status_label(status: Option<&str>) -> String {
    status
        .map(|s| map_status(s).label)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn connection_summary(id: u64, name: &str, kind: Option<&str>, status: Option<&str>) -> String {
    let line = format!("{id:>6}  {name}  ({})", kind.unwrap_or("-"));
    match status {
        Some(status) => format!("{line} {}", format_status_colored(status)),
        None => line,
    }
}

#[derive(Tabled)]
pub struct AudienceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    audience_type: String,
    #[tabled(rename = "Users")]
    users: String,
    #[tabled(rename = "Verified")]
    verified: &'static str,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Created by")]
    created_by: String,
}

impl Tabulate for AudienceListItem {
    type Row = AudienceRow;

    fn row(&self) -> AudienceRow {
        AudienceRow {
            id: self.audience_id,
            name: truncate(&self.name, 40),
            audience_type: title_case(&self.audience_type.to_string()),
            users: format_count(self.user_count),
            verified: if self.verified { "yes" } else { "no" },
            expires: format_epoch_date(self.expire_date),
            created_by: if self.created_by.is_empty() {
                "-".to_string()
            } else {
                self.created_by.clone()
            },
        }
    }

    fn summary(&self) -> String {
        format!(
            "{:>6}  {}  ({}, {} users, expires {})",
            self.audience_id,
            self.name,
            title_case(&self.audience_type.to_string()),
            format_count(self.user_count),
            format_epoch_date(self.expire_date)
        )
    }
}

#[derive(Tabled)]
pub struct DatasourceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl Tabulate for Datasource {
    type Row = DatasourceRow;

    fn row(&self) -> DatasourceRow {
        DatasourceRow {
            id: self.id,
            name: truncate(&self.name, 40),
            kind: self.kind.clone().unwrap_or_else(|| "-".to_string()),
            status: status_label(self.status.as_deref()),
        }
    }

    fn summary(&self) -> String {
        connection_summary(self.id, &self.name, self.kind.as_deref(), self.status.as_deref())
    }
}

#[derive(Tabled)]
pub struct DatasinkRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created by")]
    created_by: String,
}

impl Tabulate for Datasink {
    type Row = DatasinkRow;

    fn row(&self) -> DatasinkRow {
        DatasinkRow {
            id: self.id,
            name: truncate(&self.name, 40),
            kind: self.kind.clone().unwrap_or_else(|| "-".to_string()),
            status: status_label(self.status.as_deref()),
            created_by: self.created_by.clone().unwrap_or_else(|| "-".to_string()),
        }
    }

    fn summary(&self) -> String {
        connection_summary(self.id, &self.name, self.kind.as_deref(), self.status.as_deref())
    }
}

#[derive(Tabled)]
pub struct ConnectorTypeRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Type")]
    connector_type: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Active")]
    active: &'static str,
    #[tabled(rename = "Required")]
    required: String,
}

impl Tabulate for ConnectorType {
    type Row = ConnectorTypeRow;

    fn row(&self) -> ConnectorTypeRow {
        let required = self.required_fields();
        ConnectorTypeRow {
            id: self.id,
            connector_type: self.connector_type.clone(),
            display_name: truncate(&self.display_name, 40),
            active: if self.active { "yes" } else { "no" },
            required: if required.is_empty() {
                "-".to_string()
            } else {
                truncate(&required.join(", "), 40)
            },
        }
    }

    fn summary(&self) -> String {
        format!("{:>6}  {}  ({})", self.id, self.display_name, self.connector_type)
    }
}
