//! Cached paginated listings.
//!
//! Parameters are validated before the cache is consulted. Counting, the
//! page range check and the page fetch all run inside the fill, so an
//! out-of-range page or a repository failure is never cached.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::application::pagination::{
    PageRequest, PageResult, PageWindow, PaginationError, paginate,
};
use crate::application::repos::RepoError;
use crate::cache::{ReadThroughCache, ReadThroughError, Tag, build_key};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    /// The owner of a scoped listing does not exist.
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to serialize listing: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl From<ReadThroughError<ListError>> for ListError {
    fn from(error: ReadThroughError<ListError>) -> Self {
        match error {
            ReadThroughError::Compute(error) => error,
            ReadThroughError::Encode(error) | ReadThroughError::Decode(error) => {
                Self::Serialization(error)
            }
        }
    }
}

/// One cached listing: an operation name plus the tags its pages carry.
#[derive(Debug, Clone)]
pub struct Listing<'a> {
    pub operation: &'a str,
    pub tags: &'a [Tag],
}

impl Listing<'_> {
    /// Serve one page of the listing through the read-through cache.
    ///
    /// `count` yields the collection size; `fetch` loads the rows of a
    /// non-empty window.
    pub async fn page<T, C, CF, F, FF>(
        &self,
        cache: &ReadThroughCache,
        page: i64,
        limit: i64,
        count: C,
        fetch: F,
    ) -> Result<PageResult<T>, ListError>
    where
        T: Serialize + DeserializeOwned,
        C: FnOnce() -> CF,
        CF: Future<Output = Result<u64, ListError>>,
        F: FnOnce(PageWindow) -> FF,
        FF: Future<Output = Result<Vec<T>, RepoError>>,
    {
        let request = PageRequest::new(page, limit)?;
        let key = build_key(self.operation, request.page(), request.limit());

        let result = cache
            .get_or_compute_json(&key, self.tags, cache.default_ttl(), move || async move {
                let total_items = count().await?;
                let window = paginate(request, total_items)?;
                if window.is_empty() {
                    return Ok(PageResult::empty(window));
                }
                let items = fetch(window).await?;
                Ok::<_, ListError>(PageResult::new(items, window))
            })
            .await?;

        Ok(result)
    }
}
