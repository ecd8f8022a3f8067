mod browse;
mod config;
mod connector_types;
mod list;
mod show;

pub use browse::cmd_browse;
pub use config::{cmd_config_get, cmd_config_path, cmd_config_set, cmd_config_show};
pub use connector_types::cmd_connector_types;
pub use list::{ListOptions, audience_filters, cmd_list};
pub use show::cmd_show;

use serde::Serialize;

use crate::cli::OutputOptions;
use crate::error::Result;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Result of a command in both of its output forms.
pub struct CommandOutput {
    json: serde_json::Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: serde_json::Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print JSON when requested, the text form otherwise. Without a text
    /// form the JSON is printed either way.
    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}
