//! The paged collections exposed by the backend and their query parameters.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{ConsoleError, Result};
use crate::list::{ListFetcher, ListPage, PageQuery, Record};
use crate::types::{AudienceListItem, Datasink, Datasource};

use super::client::ApiClient;
use super::parser::parse_page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Audiences,
    Datasources,
    Datasinks,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Audiences,
        Collection::Datasources,
        Collection::Datasinks,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Collection::Audiences => "audiences",
            Collection::Datasources => "datasources",
            Collection::Datasinks => "datasinks",
        }
    }

    /// Name of the zero-based page index parameter.
    pub fn page_param(&self) -> &'static str {
        match self {
            Collection::Audiences => "page",
            Collection::Datasources | Collection::Datasinks => "pageNum",
        }
    }

    /// Whether the endpoint understands search text and category filters.
    pub fn accepts_filters(&self) -> bool {
        matches!(self, Collection::Audiences)
    }

    /// Query-string parameters for one page request, in a stable order.
    pub fn query_params(&self, query: &PageQuery) -> Vec<(String, String)> {
        let mut params = vec![
            ("pageSize".to_string(), query.page_size.to_string()),
            (self.page_param().to_string(), query.page.to_string()),
        ];

        if !self.accepts_filters() {
            if !query.filters.is_empty() {
                tracing::debug!(
                    collection = %self,
                    filters = %query.filters,
                    "collection does not support filters, ignoring them"
                );
            }
            return params;
        }

        let search = query.filters.search.trim();
        if !search.is_empty() {
            params.push(("nameSearch".to_string(), search.to_string()));
        }
        for (category, values) in &query.filters.categories {
            let joined: Vec<&str> = values.iter().map(String::as_str).collect();
            params.push((category_param(category).to_string(), joined.join(",")));
        }
        params
    }
}

/// Wire name of an audience filter category.
fn category_param(category: &str) -> &str {
    match category {
        "created_by" => "createdBy",
        other => other,
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl FromStr for Collection {
    type Err = ConsoleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "audiences" | "audience" => Ok(Collection::Audiences),
            "datasources" | "datasource" | "sources" => Ok(Collection::Datasources),
            "datasinks" | "datasink" | "sinks" => Ok(Collection::Datasinks),
            _ => Err(ConsoleError::Other(format!(
                "unknown collection '{s}', expected one of: audiences, datasources, datasinks"
            ))),
        }
    }
}

/// [`ListFetcher`] for one collection endpoint.
pub struct CollectionFetcher<T> {
    client: Arc<ApiClient>,
    collection: Collection,
    _record: PhantomData<fn() -> T>,
}

impl<T> CollectionFetcher<T> {
    fn new(client: Arc<ApiClient>, collection: Collection) -> Self {
        Self {
            client,
            collection,
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }
}

impl CollectionFetcher<AudienceListItem> {
    pub fn audiences(client: Arc<ApiClient>) -> Self {
        Self::new(client, Collection::Audiences)
    }
}

impl CollectionFetcher<Datasource> {
    pub fn datasources(client: Arc<ApiClient>) -> Self {
        Self::new(client, Collection::Datasources)
    }
}

impl CollectionFetcher<Datasink> {
    pub fn datasinks(client: Arc<ApiClient>) -> Self {
        Self::new(client, Collection::Datasinks)
    }
}

impl<T> ListFetcher for CollectionFetcher<T>
where
    T: Record + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Record = T;

    async fn fetch_page(&self, query: &PageQuery) -> Result<ListPage<T>> {
        let params = self.collection.query_params(query);
        let body = self.client.get_text(self.collection.path(), &params).await?;
        parse_page(&body)
    }
}
