//! Line-oriented interactive browser over one collection.
//!
//! Plain text replaces the search; lines starting with `:` are commands.

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::display::Tabulate;
use crate::error::{ConsoleError, Result};
use crate::list::{
    self, FilterField, FilterState, FilterValue, ListFetcher, ListSessionConfig, ListSnapshot,
    Record,
};
use crate::remote::{ApiClient, Collection, CollectionFetcher, StaleCache};

const HELP: &str = "\
  <text>              search (empty line clears the search)
  :more, :m           load the next page
  :refresh, :r        reload from the first page
  :filter name=a,b    set a filter (name= clears it)
  :help, :h           show this help
  :quit, :q           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Search(String),
    More,
    Refresh,
    Filter(String, FilterValue),
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<BrowseCommand> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix(':') else {
        return Ok(BrowseCommand::Search(line.to_string()));
    };

    let (name, rest) = command
        .trim()
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command.trim(), ""));

    match name {
        "more" | "m" => Ok(BrowseCommand::More),
        "refresh" | "r" => Ok(BrowseCommand::Refresh),
        "help" | "h" | "?" => Ok(BrowseCommand::Help),
        "quit" | "q" | "exit" => Ok(BrowseCommand::Quit),
        "filter" | "f" => {
            let (field, values) = rest.split_once('=').ok_or_else(|| {
                ConsoleError::InvalidFilter(format!("expected name=value, got '{rest}'"))
            })?;
            let field = field.trim();
            if field.is_empty() {
                return Err(ConsoleError::InvalidFilter("filter name is empty".to_string()));
            }
            Ok(BrowseCommand::Filter(
                field.to_string(),
                FilterValue::from_csv(values),
            ))
        }
        other => Err(ConsoleError::Other(format!(
            "unknown command ':{other}', type :help for commands"
        ))),
    }
}

/// Browse `collection` interactively, reading commands from stdin.
pub async fn cmd_browse(collection: Collection, filters: FilterState) -> Result<()> {
    let config = Config::load()?;
    let client = Arc::new(ApiClient::from_config(&config)?);
    let input = BufReader::new(tokio::io::stdin());

    match collection {
        Collection::Audiences => {
            let fetcher = CollectionFetcher::audiences(client);
            browse_with_cache(fetcher, collection, &config, filters, input).await
        }
        Collection::Datasources => {
            let fetcher = CollectionFetcher::datasources(client);
            browse_with_cache(fetcher, collection, &config, filters, input).await
        }
        Collection::Datasinks => {
            let fetcher = CollectionFetcher::datasinks(client);
            browse_with_cache(fetcher, collection, &config, filters, input).await
        }
    }
}

async fn browse_with_cache<T, R>(
    fetcher: CollectionFetcher<T>,
    collection: Collection,
    config: &Config,
    filters: FilterState,
    input: R,
) -> Result<()>
where
    T: Record + Tabulate + DeserializeOwned + Clone + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
{
    let session = ListSessionConfig::from(config);
    match config.stale_window() {
        Some(window) => {
            let cached = StaleCache::new(fetcher, window);
            browse(cached, collection, session, filters, input).await
        }
        None => browse(fetcher, collection, session, filters, input).await,
    }
}

async fn browse<F, R>(
    fetcher: F,
    collection: Collection,
    session: ListSessionConfig,
    filters: FilterState,
    input: R,
) -> Result<()>
where
    F: ListFetcher,
    F::Record: Tabulate,
    R: AsyncBufRead + Unpin,
{
    let mut handle = list::spawn(Arc::new(fetcher), session, filters);
    println!(
        "{} {}",
        format!("Browsing {collection}.").bold(),
        "Type :help for commands.".dimmed()
    );

    let mut shown = 0;
    let snapshot = handle.wait_idle().await?;
    render(&snapshot, &mut shown, collection);

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.to_string().red());
                continue;
            }
        };

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                println!("{HELP}");
                continue;
            }
            BrowseCommand::More => handle.load_more()?,
            BrowseCommand::Search(text) => {
                shown = 0;
                handle.set_search(text)?;
            }
            BrowseCommand::Refresh => {
                shown = 0;
                handle.refresh()?;
            }
            BrowseCommand::Filter(name, value) => {
                shown = 0;
                handle.set_filter(FilterField::category(name), value)?;
            }
        }

        let snapshot = handle.wait_idle().await?;
        render(&snapshot, &mut shown, collection);
    }

    handle.close().await;
    Ok(())
}

/// Print records not shown yet, then the list state.
fn render<T: Tabulate>(snapshot: &ListSnapshot<T>, shown: &mut usize, collection: Collection) {
    if *shown == 0 {
        println!("{}", format!("-- {collection}: {} --", snapshot.filters).dimmed());
    }
    if *shown > snapshot.records.len() {
        *shown = 0;
    }
    for record in &snapshot.records[*shown..] {
        println!("{}", record.summary());
    }
    *shown = snapshot.records.len();

    if let Some(failure) = &snapshot.error {
        println!(
            "{} {}",
            format!("Error: {}", failure.message).red(),
            "(:more retries)".dimmed()
        );
    } else if snapshot.records.is_empty() {
        println!("{}", format!("No {collection} found.").dimmed());
    } else if snapshot.has_more {
        println!(
            "{}",
            format!("-- {} loaded, more available (:more) --", snapshot.records.len()).dimmed()
        );
    } else {
        println!(
            "{}",
            format!("-- {} loaded, end of list --", snapshot.records.len()).dimmed()
        );
    }
}
