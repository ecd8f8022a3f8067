pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod list;
pub mod paths;
pub mod remote;
pub mod types;

#[cfg(test)]
mod test_guards;

pub use config::Config;
pub use error::{ConsoleError, Result};
pub use list::{
    FilterField, FilterState, FilterValue, ListController, ListFetcher, ListHandle, ListPage,
    ListSnapshot, PageQuery, Record,
};
pub use remote::{ApiClient, Collection, CollectionFetcher, StaleCache};
pub use types::{
    AudienceDetails, AudienceListItem, AudienceStatus, AudienceType, ConnectorKind, ConnectorType,
    Datasink, Datasource,
};
