use clap::{Args, Parser, Subcommand};
use std::str::FromStr;

use crate::commands::ListOptions;
use crate::list::FilterState;
use crate::remote::Collection;
use crate::types::{AudienceStatus, ConnectorKind, VALID_CONNECTOR_KINDS, VALID_STATUSES};

#[derive(Parser)]
#[command(name = "audience")]
#[command(about = "Browse audiences, datasources and datasinks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by every command.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// How many pages a list command loads.
#[derive(Args, Debug, Clone, Default)]
pub struct PagingArgs {
    /// Load pages until at least this many records are shown
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Load every page
    #[arg(long, conflicts_with = "limit")]
    pub all: bool,

    /// Records per request (default: lists.page_size)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List audiences
    #[command(visible_alias = "a")]
    Audiences {
        /// Name search
        #[arg(short, long)]
        search: Option<String>,

        /// Only audiences created by this user
        #[arg(long)]
        created_by: Option<String>,

        /// Only verified (true) or unverified (false) audiences
        #[arg(long, value_parser = parse_bool_strict)]
        verified: Option<bool>,

        /// Status filter, comma separated (LIVE, DRAFT, PAUSED, CONCLUDED, TERMINATED)
        #[arg(long, value_delimiter = ',', value_parser = parse_status)]
        status: Vec<AudienceStatus>,

        /// Tag filter, comma separated
        #[arg(long, value_delimiter = ',')]
        tag: Vec<String>,

        #[command(flatten)]
        paging: PagingArgs,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Show one audience with its sinks and rules
    Show {
        /// Audience ID
        id: u64,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// List datasources
    #[command(visible_alias = "sources")]
    Datasources {
        #[command(flatten)]
        paging: PagingArgs,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// List datasinks
    #[command(visible_alias = "sinks")]
    Datasinks {
        #[command(flatten)]
        paging: PagingArgs,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// List the connector types datasources or datasinks can use
    #[command(visible_alias = "connectors")]
    ConnectorTypes {
        /// Connector kind: SINK or SOURCE
        #[arg(long, value_parser = parse_connector_kind)]
        kind: ConnectorKind,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Browse a collection interactively, reading commands from stdin
    #[command(visible_alias = "b")]
    Browse {
        /// Collection: audiences, datasources or datasinks
        #[arg(default_value = "audiences", value_parser = parse_collection)]
        collection: Collection,

        /// Initial name search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Set a configuration value
    Set {
        /// Config key (e.g. lists.page_size, api.base_url, auth.token)
        key: String,

        /// Value to set
        value: String,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Get a configuration value
    Get {
        /// Config key
        key: String,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Print the config file path
    Path {
        #[command(flatten)]
        output: OutputOptions,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            audience_filters, cmd_browse, cmd_config_get, cmd_config_path,
            cmd_config_set, cmd_config_show, cmd_connector_types, cmd_list, cmd_show,
        };

        match self {
            Commands::Audiences {
                search,
                created_by,
                verified,
                status,
                tag,
                paging,
                output,
            } => {
                let filters = audience_filters(
                    search.as_deref(),
                    created_by.as_deref(),
                    verified,
                    &status,
                    &tag,
                )?;
                cmd_list(
                    Collection::Audiences,
                    list_options(filters, paging),
                    output,
                )
                .await
            }
            Commands::Show { id, output } => cmd_show(id, output).await,
            Commands::Datasources { paging, output } => {
                cmd_list(
                    Collection::Datasources,
                    list_options(FilterState::new(), paging),
                    output,
                )
                .await
            }
            Commands::Datasinks { paging, output } => {
                cmd_list(
                    Collection::Datasinks,
                    list_options(FilterState::new(), paging),
                    output,
                )
                .await
            }

            Commands::ConnectorTypes { kind, output } => cmd_connector_types(kind, output).await,

            Commands::Browse { collection, search } => {
                let filters = audience_filters(search.as_deref(), None, None, &[], &[])?;
                cmd_browse(collection, filters).await
            }

            Commands::Config { action } => match action {
                ConfigAction::Show { output } => cmd_config_show(output),
                ConfigAction::Set { key, value, output } => cmd_config_set(&key, &value, output),
                ConfigAction::Get { key, output } => cmd_config_get(&key, output),
                ConfigAction::Path { output } => cmd_config_path(output),
            },
        }
    }
}

fn list_options(filters: FilterState, paging: PagingArgs) -> ListOptions {
    ListOptions {
        filters,
        limit: paging.limit,
        all: paging.all,
        page_size: paging.page_size,
    }
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_status(s: &str) -> Result<AudienceStatus, String> {
    parse_with_validation(
        s,
        |v| AudienceStatus::from_str(v).map_err(|_| String::new()),
        "status",
        VALID_STATUSES,
    )
}

fn parse_collection(s: &str) -> Result<Collection, String> {
    parse_with_validation(
        s,
        |v| Collection::from_str(v).map_err(|_| String::new()),
        "collection",
        &["audiences", "datasources", "datasinks"],
    )
}

fn parse_connector_kind(s: &str) -> Result<ConnectorKind, String> {
    parse_with_validation(
        s,
        |v| ConnectorKind::from_str(v).map_err(|_| String::new()),
        "connector kind",
        VALID_CONNECTOR_KINDS,
    )
}

fn parse_bool_strict(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!(
            "Invalid boolean value '{s}'. Must be 'true' or 'false'"
        )),
    }
}
