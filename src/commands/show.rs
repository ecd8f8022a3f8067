use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display::{format_count, format_epoch_date, render_table, title_case};
use crate::error::Result;
use crate::remote::ApiClient;
use crate::types::AudienceDetails;

/// Display one audience with the sinks it feeds and its rules
pub async fn cmd_show(audience_id: u64, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let client = ApiClient::from_config(&config)?;
    let details = client.audience_details(audience_id).await?;

    let text = format_details(&details);
    CommandOutput::new(json!(details))
        .with_text(text)
        .print(output)
}

fn format_details(details: &AudienceDetails) -> String {
    let meta = &details.audience_meta;
    let mut out = format!(
        "{} {}",
        meta.name.bold(),
        format!("#{}", meta.audience_id).dimmed()
    );
    if meta.verified {
        out.push_str(&format!(" {}", "[verified]".green()));
    }
    if !meta.description.is_empty() {
        out.push_str(&format!("\n{}", meta.description));
    }

    let created_by = if meta.created_by.is_empty() {
        "-"
    } else {
        meta.created_by.as_str()
    };
    let fields = [
        ("Type", title_case(&meta.audience_type.to_string())),
        ("Users", format_count(meta.user_count)),
        ("Expires", format_epoch_date(meta.expire_date)),
        ("Created", format_epoch_date(meta.created_at)),
        ("Created by", created_by.to_string()),
        (
            "Last refreshed",
            format_epoch_date(meta.last_audience_updated_at),
        ),
    ];
    out.push('\n');
    for (label, value) in fields {
        out.push_str(&format!("\n  {:<15} {value}", format!("{label}:")));
    }

    out.push_str(&format!(
        "\n\n{} ({})",
        "Sinks".cyan().bold(),
        details.sinks.len()
    ));
    if details.sinks.is_empty() {
        out.push_str(&format!("\n  {}", "none".dimmed()));
    } else {
        out.push('\n');
        out.push_str(&render_table(&details.sinks));
    }

    out.push_str(&format!(
        "\n\n{} ({})",
        "Rules".cyan().bold(),
        details.rules.len()
    ));
    for rule in &details.rules {
        out.push_str(&format!("\n  {rule}"));
    }
    out
}
