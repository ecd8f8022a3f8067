//! Decoding of the `{"data": ...}` envelope every endpoint answers with.
//!
//! Paged collections nest a page inside it:
//!
//! ```json
//! {"data": {"page_info": {"page": 0, "page_size": 20, "has_more": true}, "data": [ ... ]}}
//! ```
//!
//! Missing pieces are tolerated: no outer `data`, no inner array or no
//! `has_more` all read as an empty or final page.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::list::ListPage;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PagedBody<T> {
    #[serde(default)]
    page_info: Option<PageInfo>,
    #[serde(default = "Option::default")]
    data: Option<Vec<T>>,
}

/// Paging metadata echoed by the server.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// Decode a paged response body into a [`ListPage`].
pub fn parse_page<T: DeserializeOwned>(body: &str) -> Result<ListPage<T>> {
    let envelope: Envelope<PagedBody<T>> = serde_json::from_str(body)?;
    let Some(body) = envelope.data else {
        return Ok(ListPage::empty());
    };

    let has_more = body
        .page_info
        .and_then(|info| info.has_more)
        .unwrap_or(false);
    Ok(ListPage::new(body.data.unwrap_or_default(), has_more))
}

/// Decode the payload of a non-paged response. `None` when the body carries
/// no `data` (absent or null).
pub fn parse_data<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.data)
}
