use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConsoleError;
use crate::list::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudienceType {
    #[default]
    Static,
    Conditional,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AudienceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudienceType::Static => write!(f, "STATIC"),
            AudienceType::Conditional => write!(f, "CONDITIONAL"),
            AudienceType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Lifecycle state of an audience, as accepted by the `status` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudienceStatus {
    Live,
    Draft,
    Paused,
    Concluded,
    Terminated,
}

impl fmt::Display for AudienceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudienceStatus::Live => write!(f, "LIVE"),
            AudienceStatus::Draft => write!(f, "DRAFT"),
            AudienceStatus::Paused => write!(f, "PAUSED"),
            AudienceStatus::Concluded => write!(f, "CONCLUDED"),
            AudienceStatus::Terminated => write!(f, "TERMINATED"),
        }
    }
}

impl FromStr for AudienceStatus {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LIVE" => Ok(AudienceStatus::Live),
            "DRAFT" => Ok(AudienceStatus::Draft),
            "PAUSED" => Ok(AudienceStatus::Paused),
            "CONCLUDED" => Ok(AudienceStatus::Concluded),
            "TERMINATED" => Ok(AudienceStatus::Terminated),
            _ => Err(ConsoleError::InvalidFilter(format!(
                "unknown status '{s}', expected one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

pub const VALID_STATUSES: &[&str] = &["LIVE", "DRAFT", "PAUSED", "CONCLUDED", "TERMINATED"];

/// One row of the audiences list. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceListItem {
    pub audience_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub audience_type: AudienceType,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub rule_count: u64,
    #[serde(default)]
    pub expire_date: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub created_by: String,
}

impl Record for AudienceListItem {
    type Key = u64;

    fn key(&self) -> u64 {
        self.audience_id
    }
}

/// A configured data source connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Record for Datasource {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// A configured data sink connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasink {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Record for Datasink {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// Header of the audience detail view. Field names are camelCase on the wire,
/// unlike the list rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceMeta {
    pub audience_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub audience_type: AudienceType,
    /// Ids of the datasinks the audience is pushed to
    #[serde(default)]
    pub sinks: Vec<u64>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub expire_date: Option<i64>,
    #[serde(default)]
    pub last_audience_updated_at: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xproject_id: Option<String>,
}

/// One audience with the sinks it feeds and its targeting rules.
///
/// Rules have no fixed shape and are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceDetails {
    pub audience_meta: AudienceMeta,
    #[serde(default)]
    pub sinks: Vec<Datasink>,
    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

/// Which side of a connection a connector type configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectorKind {
    Sink,
    Source,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Sink => write!(f, "SINK"),
            ConnectorKind::Source => write!(f, "SOURCE"),
        }
    }
}

impl FromStr for ConnectorKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SINK" | "SINKS" => Ok(ConnectorKind::Sink),
            "SOURCE" | "SOURCES" => Ok(ConnectorKind::Source),
            _ => Err(ConsoleError::Other(format!(
                "unknown connector kind '{s}', expected one of: {}",
                VALID_CONNECTOR_KINDS.join(", ")
            ))),
        }
    }
}

pub const VALID_CONNECTOR_KINDS: &[&str] = &["SINK", "SOURCE"];

/// A connector implementation that datasources or datasinks can be created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorType {
    pub id: u64,
    pub kind: ConnectorKind,
    #[serde(rename = "type")]
    pub connector_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<ConnectorConfigSchema>,
    #[serde(default)]
    pub active: bool,
}

/// JSON-schema-like description of a connector's configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfigSchema {
    #[serde(rename = "type", default)]
    pub schema_type: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, ConnectorProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorProperty {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ConnectorType {
    /// Names of the configuration fields that must be supplied.
    pub fn required_fields(&self) -> &[String] {
        self.config_schema
            .as_ref()
            .map(|schema| schema.required.as_slice())
            .unwrap_or_default()
    }
}
