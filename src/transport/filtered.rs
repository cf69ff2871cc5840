use super::Fetch;
use crate::filter::BodyFilter;
use crate::types::{RequestInit, RequestTarget};
use crate::Result;
use async_trait::async_trait;

/// A [`Fetch`] that strips token-limit fields from JSON bodies before
/// delegating to `inner`.
///
/// The inner response and any inner error are returned unchanged.
#[derive(Debug, Clone)]
pub struct FilteredFetch<T> {
    inner: T,
    filter: BodyFilter,
}

impl<T: Fetch> FilteredFetch<T> {
    pub fn new(inner: T) -> Self {
        Self::with_filter(inner, BodyFilter::default())
    }

    pub fn with_filter(inner: T, filter: BodyFilter) -> Self {
        Self { inner, filter }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn filter(&self) -> &BodyFilter {
        &self.filter
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait]
impl<T: Fetch> Fetch for FilteredFetch<T> {
    type Response = T::Response;

    async fn fetch(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
    ) -> Result<Self::Response> {
        let init = self.filter.apply(init)?;
        self.inner.fetch(target, init).await
    }
}
