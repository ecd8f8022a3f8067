use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::cli::OutputOptions;
use crate::commands::print_json;
use crate::config::Config;
use crate::display::{Tabulate, render_table};
use crate::error::{ConsoleError, Result};
use crate::list::{
    self, FilterField, FilterState, FilterValue, ListFetcher, ListSessionConfig, ListSnapshot,
    Record,
};
use crate::remote::{ApiClient, Collection, CollectionFetcher};
use crate::types::AudienceStatus;

/// How much of a collection to fetch.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filters: FilterState,
    /// Stop once at least this many records are loaded
    pub limit: Option<usize>,
    /// Keep loading until the last page
    pub all: bool,
    /// Override `lists.page_size`
    pub page_size: Option<u32>,
}

impl ListOptions {
    fn wants_more(&self, loaded: usize) -> bool {
        match self.limit {
            Some(limit) => loaded < limit,
            None => self.all,
        }
    }
}

/// Build the filter state for the audiences list from command-line values.
pub fn audience_filters(
    search: Option<&str>,
    created_by: Option<&str>,
    verified: Option<bool>,
    statuses: &[AudienceStatus],
    tags: &[String],
) -> Result<FilterState> {
    let mut filters = FilterState::new();
    if let Some(search) = search {
        filters.apply(FilterField::Search, FilterValue::text(search.trim()))?;
    }
    if let Some(created_by) = created_by {
        filters.apply(
            FilterField::category("created_by"),
            FilterValue::text(created_by.trim()),
        )?;
    }
    if let Some(verified) = verified {
        filters.apply(
            FilterField::category("verified"),
            FilterValue::text(verified.to_string()),
        )?;
    }
    if !statuses.is_empty() {
        filters.apply(
            FilterField::category("status"),
            FilterValue::tags(statuses.iter().map(ToString::to_string)),
        )?;
    }
    if !tags.is_empty() {
        filters.apply(
            FilterField::category("tag"),
            FilterValue::tags(tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty())),
        )?;
    }
    Ok(filters)
}

/// List one collection as a table or JSON.
pub async fn cmd_list(
    collection: Collection,
    options: ListOptions,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let client = Arc::new(ApiClient::from_config(&config)?);

    match collection {
        Collection::Audiences => {
            let fetcher = CollectionFetcher::audiences(client);
            list_records(fetcher, collection, &config, &options, output).await
        }
        Collection::Datasources => {
            let fetcher = CollectionFetcher::datasources(client);
            list_records(fetcher, collection, &config, &options, output).await
        }
        Collection::Datasinks => {
            let fetcher = CollectionFetcher::datasinks(client);
            list_records(fetcher, collection, &config, &options, output).await
        }
    }
}

async fn list_records<T>(
    fetcher: CollectionFetcher<T>,
    collection: Collection,
    config: &Config,
    options: &ListOptions,
    output: OutputOptions,
) -> Result<()>
where
    T: Record + Tabulate + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let snapshot = load_pages(fetcher, config, options).await?;

    let mut records = Arc::unwrap_or_clone(snapshot.records);
    let loaded = records.len();
    if let Some(limit) = options.limit {
        records.truncate(limit);
    }
    let has_more = snapshot.has_more || records.len() < loaded;

    if output.json {
        return print_json(&json!({
            "collection": collection.to_string(),
            "filters": {
                "search": snapshot.filters.search,
                "categories": snapshot.filters.categories,
            },
            "count": records.len(),
            "pages_loaded": snapshot.page_cursor + 1,
            "has_more": has_more,
            "records": records,
        }));
    }

    if records.is_empty() {
        println!("No {collection} found.");
        return Ok(());
    }

    println!("{}", render_table(&records));
    let footer = format!("{} {collection}", records.len());
    if has_more {
        println!(
            "\n{} {}",
            footer,
            "(more available, use --all or --limit)".dimmed()
        );
    } else {
        println!("\n{footer}");
    }
    Ok(())
}

/// Run a list session until `options` are satisfied or the list ends.
async fn load_pages<F: ListFetcher>(
    fetcher: F,
    config: &Config,
    options: &ListOptions,
) -> Result<ListSnapshot<F::Record>> {
    let mut session = ListSessionConfig::from(config);
    if let Some(page_size) = options.page_size {
        session.page_size = page_size;
    }

    let mut handle = list::spawn(Arc::new(fetcher), session, options.filters.clone());
    let mut snapshot = handle.wait_idle().await?;

    loop {
        if let Some(failure) = snapshot.error.take() {
            handle.close().await;
            return Err(ConsoleError::from(failure));
        }
        if !snapshot.has_more || !options.wants_more(snapshot.records.len()) {
            break;
        }
        handle.load_more()?;
        snapshot = handle.wait_idle().await?;
    }

    handle.close().await;
    Ok(snapshot)
}
