//! The read loop
//!
//! A `ReadLoop` walks a stream's slices front to back, draining every page
//! of a slice before moving to the next. Records are handed out one at a
//! time; the page cursor never outlives the slice it belongs to.

use super::http_stream::HttpStream;
use super::types::{ReadOptions, ReadStats};
use crate::error::Result;
use crate::pagination::{NextPage, PageCursor};
use crate::slice::Slice;
use crate::state::{CursorReducer, StreamState};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
enum Phase {
    /// Slices not enumerated yet
    Pending,
    NextSlice,
    Reading {
        slice: Slice,
        cursor: Option<PageCursor>,
    },
    Done,
}

/// Lazy record sequence of one stream read
#[derive(Debug)]
pub struct ReadLoop {
    stream: Arc<HttpStream>,
    /// Checkpoint as of the start of the read; requests and staleness use it
    start: Option<StreamState>,
    /// Running checkpoint, advanced per emitted record
    checkpoint: StreamState,
    reducer: Option<CursorReducer>,
    options: ReadOptions,
    phase: Phase,
    slices: VecDeque<Slice>,
    buffer: VecDeque<Value>,
    stats: ReadStats,
}

impl ReadLoop {
    pub(crate) fn new(
        stream: Arc<HttpStream>,
        state: Option<StreamState>,
        options: ReadOptions,
    ) -> Self {
        let reducer = stream.incremental().map(|inc| inc.reducer());
        let start = state.filter(|s| !s.is_empty());
        Self {
            checkpoint: start.clone().unwrap_or_default(),
            start,
            reducer,
            options,
            phase: Phase::Pending,
            slices: VecDeque::new(),
            buffer: VecDeque::new(),
            stats: ReadStats::default(),
            stream,
        }
    }

    pub fn stream_name(&self) -> &str {
        self.stream.name()
    }

    /// Checkpoint after the records emitted so far
    pub fn checkpoint(&self) -> Option<&StreamState> {
        if self.reducer.is_none() || self.checkpoint.is_empty() {
            None
        } else {
            Some(&self.checkpoint)
        }
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    fn budget_exhausted(&self) -> bool {
        self.options
            .max_records
            .is_some_and(|max| self.stats.records >= max)
    }

    /// Next record, or `None` once every slice is drained.
    ///
    /// An error ends the read; later calls return `None`.
    pub async fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            if self.budget_exhausted() {
                if !matches!(self.phase, Phase::Done) {
                    info!(stream = %self.stream.name(), records = self.stats.records, "Record limit reached");
                }
                self.buffer.clear();
                self.phase = Phase::Done;
                return Ok(None);
            }

            if let Some(record) = self.buffer.pop_front() {
                self.stats.records += 1;
                if let Some(reducer) = &self.reducer {
                    reducer.update(&mut self.checkpoint, &record);
                }
                return Ok(Some(record));
            }

            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Pending => {
                    let slices = match self.stream.slicer() {
                        Some(slicer) => slicer.slices(self.start.as_ref()).await?,
                        None => vec![Slice::root()],
                    };
                    info!(stream = %self.stream.name(), slices = slices.len(), "Starting read");
                    self.slices = slices.into();
                    self.phase = Phase::NextSlice;
                }
                Phase::NextSlice => {
                    if let Some(slice) = self.slices.pop_front() {
                        debug!(stream = %self.stream.name(), slice = %slice, "Reading slice");
                        self.stats.slices += 1;
                        self.phase = Phase::Reading {
                            slice,
                            cursor: None,
                        };
                    } else {
                        info!(
                            stream = %self.stream.name(),
                            records = self.stats.records,
                            pages = self.stats.pages,
                            "Finished read"
                        );
                    }
                }
                Phase::Reading { slice, cursor } => {
                    let fetched = self
                        .stream
                        .fetch_page(self.start.as_ref(), &slice, cursor.as_ref())
                        .await;
                    match fetched {
                        Ok(page) => {
                            self.stats.pages += 1;
                            let exhausted = self.accept(page.records);
                            self.phase = match page.next {
                                NextPage::Continue(next) if !exhausted => Phase::Reading {
                                    slice,
                                    cursor: Some(next),
                                },
                                _ => Phase::NextSlice,
                            };
                        }
                        Err(e) if self.stream.error_policy().is_suppressed(&e) => {
                            warn!(
                                stream = %self.stream.name(),
                                slice = %slice,
                                error = %e,
                                "Suppressed error, skipping slice"
                            );
                            self.stats.suppressed += 1;
                            self.phase = Phase::NextSlice;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Phase::Done => return Ok(None),
            }
        }
    }

    /// Buffer a page's records, dropping those the checkpoint already covers.
    ///
    /// Returns true when the slice has nothing newer left to offer.
    fn accept(&mut self, mut records: Vec<Value>) -> bool {
        let descending = self
            .stream
            .incremental()
            .is_some_and(|inc| inc.descending);
        let checkpoint = self
            .start
            .as_ref()
            .zip(self.stream.incremental())
            .and_then(|(state, inc)| state.get(&inc.cursor_field));

        let (Some(reducer), Some(checkpoint)) = (&self.reducer, checkpoint) else {
            if descending {
                records.reverse();
            }
            self.buffer.extend(records);
            return false;
        };

        if descending {
            // Newest first: a stale head means the whole page is stale
            if records
                .first()
                .is_some_and(|newest| !reducer.is_newer(Some(checkpoint), newest))
            {
                self.stats.skipped += records.len();
                return true;
            }
            records.reverse();
        }

        let total = records.len();
        let fresh: Vec<Value> = records
            .into_iter()
            .filter(|r| reducer.is_newer(Some(checkpoint), r))
            .collect();
        let stale = total - fresh.len();
        self.stats.skipped += stale;
        self.buffer.extend(fresh);

        descending && stale > 0
    }

    /// Drain the remaining records
    pub async fn collect_all(&mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// The remaining records as a `futures::Stream`
    pub fn into_stream(self) -> BoxStream<'static, Result<Value>> {
        stream::try_unfold(self, |mut read| async move {
            Ok(read.next_record().await?.map(|record| (record, read)))
        })
        .boxed()
    }
}
