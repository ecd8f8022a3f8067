//! Reads that return one resource or a short unpaged list.

use crate::error::{ConsoleError, Result};
use crate::types::{AudienceDetails, ConnectorKind, ConnectorType};

use super::client::ApiClient;
use super::parser::parse_data;

impl ApiClient {
    /// Fetch one audience with its sinks and rules.
    pub async fn audience_details(&self, audience_id: u64) -> Result<AudienceDetails> {
        let body = self
            .get_text(&format!("audiences/{audience_id}"), &[])
            .await?;
        parse_data(&body)?.ok_or_else(|| {
            ConsoleError::Other(format!("response for audience {audience_id} has no data"))
        })
    }

    /// List the connector types of one kind. A response without data reads as
    /// no connector types.
    pub async fn connector_types(&self, kind: ConnectorKind) -> Result<Vec<ConnectorType>> {
        let params = [("kind".to_string(), kind.to_string())];
        let body = self.get_text("connector-types", &params).await?;
        let types: Option<Vec<ConnectorType>> = parse_data(&body)?;
        Ok(types.unwrap_or_default())
    }
}
