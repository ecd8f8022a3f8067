use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display::render_table;
use crate::error::Result;
use crate::remote::ApiClient;
use crate::types::ConnectorKind;

/// List the connector types available for datasources or datasinks
pub async fn cmd_connector_types(kind: ConnectorKind, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let client = ApiClient::from_config(&config)?;
    let types = client.connector_types(kind).await?;

    let text = if types.is_empty() {
        format!("No {} connector types found.", kind.to_string().to_lowercase())
    } else {
        format!("{}\n\n{} connector types", render_table(&types), types.len())
    };

    CommandOutput::new(json!({
        "kind": kind.to_string(),
        "count": types.len(),
        "connector_types": types,
    }))
    .with_text(text)
    .print(output)
}
