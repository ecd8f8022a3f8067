//! Filter snapshots for paginated list views.
//!
//! A `FilterState` is everything that selects *which* records a list shows:
//! free-text search plus categorical tag selections. The page cursor is kept
//! beside it, never inside it, so `FilterState` equality is exactly the
//! "did the query change" test that decides whether accumulated pages survive.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ConsoleError, Result};

/// A single editable field of a list's filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    /// Free-text search
    Search,
    /// A named categorical filter, e.g. `status` or `tag`
    Category(String),
}

impl FilterField {
    pub fn category(name: impl Into<String>) -> Self {
        FilterField::Category(name.into())
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterField::Search => write!(f, "search"),
            FilterField::Category(name) => write!(f, "{name}"),
        }
    }
}

/// The value assigned to a `FilterField`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Text(String),
    Tags(BTreeSet<String>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }

    pub fn tags<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::Tags(values.into_iter().map(Into::into).collect())
    }

    /// Parse the `a,b,c` form used on the command line and in query strings.
    pub fn from_csv(raw: &str) -> Self {
        FilterValue::Tags(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Immutable snapshot of a list query, excluding the page cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub search: String,
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterState::apply`].
    pub fn with(mut self, field: FilterField, value: FilterValue) -> Result<Self> {
        self.apply(field, value)?;
        Ok(self)
    }

    /// Assign `value` to `field`.
    ///
    /// An empty tag selection removes the category, so "nothing selected"
    /// and "never selected" compare equal.
    pub fn apply(&mut self, field: FilterField, value: FilterValue) -> Result<()> {
        match (field, value) {
            (FilterField::Search, FilterValue::Text(text)) => {
                self.search = text;
            }
            (FilterField::Category(name), FilterValue::Tags(tags)) => {
                if tags.is_empty() {
                    self.categories.remove(&name);
                } else {
                    self.categories.insert(name, tags);
                }
            }
            (FilterField::Category(name), FilterValue::Text(text)) => {
                if text.is_empty() {
                    self.categories.remove(&name);
                } else {
                    self.categories.insert(name, BTreeSet::from([text]));
                }
            }
            (FilterField::Search, FilterValue::Tags(_)) => {
                return Err(ConsoleError::InvalidFilter(
                    "search takes text, not a tag selection".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Current value of `field`, in the shape `apply` accepts.
    pub fn get(&self, field: &FilterField) -> FilterValue {
        match field {
            FilterField::Search => FilterValue::Text(self.search.clone()),
            FilterField::Category(name) => {
                FilterValue::Tags(self.categories.get(name).cloned().unwrap_or_default())
            }
        }
    }

    pub fn tags(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(category)
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.categories.is_empty()
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(no filters)");
        }
        let mut parts = Vec::new();
        if !self.search.is_empty() {
            parts.push(format!("search=\"{}\"", self.search));
        }
        for (name, tags) in &self.categories {
            let joined: Vec<&str> = tags.iter().map(String::as_str).collect();
            parts.push(format!("{name}={}", joined.join(",")));
        }
        write!(f, "{}", parts.join(" "))
    }
}
