//! Filtered, paginated list views.
//!
//! The pieces stack bottom-up: [`filters`] and [`accumulated`] hold data,
//! [`fetcher`] is the contract a collection endpoint implements,
//! [`controller`] is the synchronous state machine, and [`session`] runs a
//! controller on a tokio task with debounced filter edits.

pub mod accumulated;
pub mod controller;
pub mod debounce;
pub mod fetcher;
pub mod filters;
pub mod session;

pub use accumulated::{AccumulatedList, Record};
pub use controller::{
    Completion, FailureKind, FetchFailure, FetchRequest, FetchTicket, ListController,
    ListSnapshot,
};
pub use debounce::Debouncer;
pub use fetcher::{ListFetcher, ListPage, PageQuery};
pub use filters::{FilterField, FilterState, FilterValue};
pub use session::{ListHandle, ListSessionConfig, spawn};
