//! Batched write accumulation and the create-with-retry helper.
//!
//! Document stores cap the number of operations per commit; the importer
//! also wants bounded memory. [`BatchWriter`] carries that state explicitly
//! (operations queue, ceiling, commit counter) instead of module-level
//! globals, so the pipeline can run inside a long-lived process without
//! cross-run leakage.

use crate::domain::store::{DocRef, DocumentStore, Fields, StoreError, WriteOp};
use crate::error::ImportError;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Per-commit operation ceiling of the document store.
pub const MAX_BATCH_OPS: usize = 400;

/// Accumulates write operations and commits them in bounded batches.
///
/// A batch is flushed automatically when it reaches the ceiling and once
/// more explicitly at the end of a run, so a run enqueuing `n` operations
/// performs `ceil(n / ceiling)` commits.
pub struct BatchWriter<S> {
    store: Arc<S>,
    ops: Vec<WriteOp>,
    max_ops: usize,
    commits: usize,
}

impl<S: DocumentStore> BatchWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_max_ops(store, MAX_BATCH_OPS)
    }

    /// Ceiling override for tests exercising the flush cadence.
    pub fn with_max_ops(store: Arc<S>, max_ops: usize) -> Self {
        Self {
            store,
            ops: Vec::new(),
            max_ops: max_ops.max(1),
            commits: 0,
        }
    }

    /// Enqueues one operation, committing the batch when it hits the
    /// ceiling.
    ///
    /// # Errors
    ///
    /// Propagates the commit failure when an automatic flush runs.
    pub async fn push(&mut self, op: WriteOp) -> Result<(), StoreError> {
        self.ops.push(op);
        if self.ops.len() >= self.max_ops {
            self.flush().await?;
        }
        Ok(())
    }

    /// Commits any pending operations. A no-op on an empty queue.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if self.ops.is_empty() {
            return Ok(());
        }
        let ops = std::mem::take(&mut self.ops);
        let count = ops.len();
        self.store.commit(ops).await?;
        self.commits += 1;
        debug!(ops = count, commit = self.commits, "flushed write batch");
        Ok(())
    }

    /// Operations queued but not yet committed.
    pub fn pending(&self) -> usize {
        self.ops.len()
    }

    /// Commits performed so far.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

/// Creates a document at `first`, retrying with candidates from
/// `next_candidate` when the id is already taken.
///
/// `build` produces the payload for each candidate, so fields mirroring the
/// document id (a link's `short_code`) stay consistent across retries.
/// After `max_attempts` collisions the last colliding id is surfaced as
/// [`ImportError::LinkIdExhausted`] — under heavy cross-run contention the
/// caller records a row error instead of looping.
///
/// # Errors
///
/// - [`ImportError::LinkIdExhausted`] when every attempt collided
/// - [`ImportError::Store`] on any other backend failure
pub async fn create_with_retry<S, B, N, Fut>(
    store: &S,
    first: DocRef,
    max_attempts: usize,
    build: B,
    mut next_candidate: N,
) -> Result<DocRef, ImportError>
where
    S: DocumentStore + ?Sized,
    B: Fn(&DocRef) -> Fields,
    N: FnMut() -> Fut,
    Fut: Future<Output = Result<DocRef, ImportError>>,
{
    let mut doc = first;
    let mut attempt = 0;
    loop {
        match store.create(&doc, build(&doc)).await {
            Ok(()) => return Ok(doc),
            Err(StoreError::AlreadyExists(id)) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(ImportError::LinkIdExhausted { id });
                }
                debug!(id, "create collision, retrying with next candidate");
                doc = next_candidate().await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
