//! Chunked scheduling of remote calls
//!
//! Both long-running pipelines work through a queue in fixed-size chunks and
//! never start chunk N+1 before every unit of chunk N has settled. They differ
//! only in what happens inside a chunk:
//!
//! - translation batches share one rate-limited endpoint, so units run
//!   [`ChunkMode::Sequential`]ly;
//! - article keywords are independent, so units of a chunk run
//!   [`ChunkMode::Parallel`] (interleaved on the current task, not threads).
//!
//! Results always come back in the order units were issued.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use futures::future::join_all;

/// Split `items` into contiguous slices of at most `size`, preserving order.
///
/// Every slice except possibly the last has exactly `size` items.
pub fn partition<T: Clone>(items: &[T], size: NonZeroUsize) -> Vec<Vec<T>> {
    items.chunks(size.get()).map(<[T]>::to_vec).collect()
}

/// How units inside one chunk are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    /// Await each unit before issuing the next.
    Sequential,
    /// Issue every unit of the chunk at once and wait for all of them.
    Parallel,
}

#[derive(Debug, Clone)]
pub struct ChunkedScheduler {
    chunk_size: NonZeroUsize,
    mode: ChunkMode,
    pause: Duration,
}

impl ChunkedScheduler {
    pub fn new(chunk_size: NonZeroUsize, mode: ChunkMode) -> Self {
        Self {
            chunk_size,
            mode,
            pause: Duration::ZERO,
        }
    }

    /// One unit at a time, in order.
    pub fn sequential() -> Self {
        Self::new(NonZeroUsize::MIN, ChunkMode::Sequential)
    }

    /// Wait `pause` between consecutive chunks.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }

    pub fn mode(&self) -> ChunkMode {
        self.mode
    }

    /// Run `task` over every unit and collect the results in issue order.
    ///
    /// `task` must turn failures into values; the scheduler itself never
    /// stops early.
    pub async fn run<U, R, F, Fut>(&self, units: Vec<U>, task: F) -> Vec<R>
    where
        F: Fn(U) -> Fut,
        Fut: Future<Output = R>,
    {
        let total = units.len().div_ceil(self.chunk_size.get());
        let mut results = Vec::with_capacity(units.len());
        let mut remaining = units.into_iter().peekable();
        let mut index = 0;

        while remaining.peek().is_some() {
            if index > 0 && !self.pause.is_zero() {
                tracing::debug!(pause = ?self.pause, "waiting before next chunk");
                tokio::time::sleep(self.pause).await;
            }

            let chunk: Vec<U> = remaining.by_ref().take(self.chunk_size.get()).collect();
            tracing::debug!(chunk = index + 1, total, size = chunk.len(), "starting chunk");

            match self.mode {
                ChunkMode::Sequential => {
                    for unit in chunk {
                        results.push(task(unit).await);
                    }
                }
                ChunkMode::Parallel => {
                    results.extend(join_all(chunk.into_iter().map(&task)).await);
                }
            }
            index += 1;
        }

        results
    }
}
