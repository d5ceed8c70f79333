//! The generic HTTP stream
//!
//! One `HttpStream` type serves every stream shape. What differs between
//! streams (request, extraction, pagination, slicing) is injected.

use super::read_loop::ReadLoop;
use super::types::{ErrorPolicy, IncrementalConfig, ReadOptions, StreamDescriptor};
use crate::error::Result;
use crate::extract::RecordExtractor;
use crate::http::HttpClient;
use crate::pagination::{NextPage, NoPagination, PageCursor, PageCursorStrategy, PageResponse};
use crate::request::RequestBuilder;
use crate::slice::{Slice, SliceProvider};
use crate::state::StreamState;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Records of one page and what to request next
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Value>,
    pub next: NextPage,
}

/// A paginated, optionally sliced, optionally incremental HTTP stream
pub struct HttpStream {
    descriptor: StreamDescriptor,
    client: Arc<HttpClient>,
    requester: Arc<dyn RequestBuilder>,
    extractor: Arc<dyn RecordExtractor>,
    paginator: Arc<dyn PageCursorStrategy>,
    slicer: Option<Arc<dyn SliceProvider>>,
    errors: ErrorPolicy,
    incremental: Option<IncrementalConfig>,
}

impl std::fmt::Debug for HttpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStream")
            .field("descriptor", &self.descriptor)
            .field("paginator", &self.paginator)
            .field("slicer", &self.slicer)
            .field("errors", &self.errors)
            .field("incremental", &self.incremental)
            .finish_non_exhaustive()
    }
}

impl HttpStream {
    pub fn new(
        descriptor: StreamDescriptor,
        client: Arc<HttpClient>,
        requester: Arc<dyn RequestBuilder>,
        extractor: Arc<dyn RecordExtractor>,
    ) -> Self {
        Self {
            descriptor,
            client,
            requester,
            extractor,
            paginator: Arc::new(NoPagination),
            slicer: None,
            errors: ErrorPolicy::strict(),
            incremental: None,
        }
    }

    #[must_use]
    pub fn with_paginator(mut self, paginator: Arc<dyn PageCursorStrategy>) -> Self {
        self.paginator = paginator;
        self
    }

    #[must_use]
    pub fn with_slicer(mut self, slicer: Arc<dyn SliceProvider>) -> Self {
        self.slicer = Some(slicer);
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, errors: ErrorPolicy) -> Self {
        self.errors = errors;
        self
    }

    /// Make the stream incremental; the descriptor's cursor field follows
    #[must_use]
    pub fn with_incremental(mut self, incremental: IncrementalConfig) -> Self {
        self.descriptor.cursor_field = Some(incremental.cursor_field.clone());
        self.incremental = Some(incremental);
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    pub fn incremental(&self) -> Option<&IncrementalConfig> {
        self.incremental.as_ref()
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental.is_some()
    }

    pub fn error_policy(&self) -> &ErrorPolicy {
        &self.errors
    }

    pub(crate) fn slicer(&self) -> Option<&Arc<dyn SliceProvider>> {
        self.slicer.as_ref()
    }

    /// Start reading from a checkpoint.
    ///
    /// Nothing is requested until the returned loop is polled.
    pub fn read(self: &Arc<Self>, state: Option<StreamState>, options: ReadOptions) -> ReadLoop {
        ReadLoop::new(Arc::clone(self), state, options)
    }

    /// Request, extract and paginate a single page
    pub async fn fetch_page(
        &self,
        state: Option<&StreamState>,
        slice: &Slice,
        cursor: Option<&PageCursor>,
    ) -> Result<Page> {
        let request = self.requester.build_request(state, slice, cursor)?;
        let response = self.client.send(&request).await?;
        let records = self.extractor.extract(&response, slice)?;

        let next = self.paginator.next_page(
            &PageResponse {
                body: response.json()?,
                headers: &response.headers,
                record_count: records.len(),
            },
            cursor,
        );

        debug!(
            stream = %self.descriptor.name,
            slice = %slice,
            url = %response.url,
            records = records.len(),
            done = next.is_done(),
            "Fetched page"
        );

        Ok(Page { records, next })
    }
}
