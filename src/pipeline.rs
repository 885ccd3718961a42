//! # Ingest Pipeline
//!
//! Drives the record source through the batcher and fans each batch out to
//! its own writer task. Writers never terminate the process: each returns a
//! per-batch outcome, and the dispatcher applies the configured failure
//! policy once the completion barrier has joined every launched writer.
//!
//! Dispatch proceeds `Streaming -> Draining -> Done`: while streaming, one
//! writer is launched per batch as soon as it fills; once the source is
//! exhausted (or dispatch stops early) no new writers are launched and the
//! pipeline drains the in-flight set.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::{IngestConfig, WriteErrorPolicy};
use crate::error::{LoaderError, LoaderResult};
use crate::records::{Batches, RecordSource};
use crate::store::RelationshipStore;

/// Result of one batch writer.
struct BatchOutcome {
    seq: u64,
    records: usize,
    result: LoaderResult<()>,
}

/// Summary of a completed (or aborted) pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Batches handed to a writer task, in source order.
    pub batches_dispatched: u64,
    pub batches_succeeded: u64,
    pub batches_failed: u64,
    /// Records contained in dispatched batches.
    pub records_dispatched: u64,
    /// Records contained in successfully written batches.
    pub records_written: u64,
    /// Malformed lines dropped under the skip policy.
    pub lines_skipped: u64,
}

/// Concurrent batch-ingestion pipeline over a shared store client.
pub struct IngestPipeline {
    store: Arc<dyn RelationshipStore>,
    ingest: IngestConfig,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn RelationshipStore>, ingest: IngestConfig) -> Self {
        Self { store, ingest }
    }

    /// Open an edge-list file and run the pipeline over it.
    pub async fn run_file(&self, path: &Path) -> LoaderResult<IngestReport> {
        let file = File::open(path).map_err(|e| LoaderError::InputFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.run(BufReader::new(file)).await
    }

    /// Run the pipeline over a byte stream until the source is exhausted and
    /// every launched writer has finished.
    ///
    /// Returns the run summary on success. Under the fail-fast policy the
    /// first batch failure aborts the run (after draining in-flight writers)
    /// and is returned as the error; under the continue policy failures are
    /// only tallied in the report. A malformed line under the abort policy
    /// stops dispatch the same way, after the records decoded before it have
    /// been dispatched.
    pub async fn run<R: io::Read + Send>(&self, input: R) -> LoaderResult<IngestReport> {
        let source = RecordSource::new(input);
        let mut batches = Batches::new(source, self.ingest.batch_size, self.ingest.on_malformed);

        // Admission control: absent bound preserves unbounded fan-out.
        let permits = self
            .ingest
            .max_in_flight
            .unwrap_or(Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));

        let failed = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();
        let mut seq: u64 = 0;
        let mut records_dispatched: u64 = 0;
        let mut decode_error: Option<LoaderError> = None;

        // Streaming: launch one writer per batch as soon as it fills.
        while let Some(item) = batches.next() {
            let batch = match item {
                Ok(batch) => batch,
                Err(e) => {
                    decode_error = Some(e);
                    break;
                }
            };

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| LoaderError::Internal(format!("semaphore closed: {e}")))?;

            // Re-check after waiting for admission so a failure observed
            // while parked stops dispatch deterministically.
            if self.ingest.on_write_error == WriteErrorPolicy::FailFast
                && failed.load(Ordering::SeqCst)
            {
                debug!(
                    batches_dispatched = seq,
                    "Stopping dispatch after batch failure"
                );
                break;
            }

            seq += 1;
            records_dispatched += batch.len() as u64;

            let store = Arc::clone(&self.store);
            let failed = Arc::clone(&failed);
            let batch_seq = seq;

            // Registration is inseparable from launch: the handle is pushed
            // in the same iteration, so the barrier can never open early.
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let records = batch.len();
                let result = store.write_edges(&batch).await;
                match &result {
                    Ok(()) => {
                        info!(batch = batch_seq, records, "Finished processing batch");
                    }
                    Err(e) => {
                        failed.store(true, Ordering::SeqCst);
                        error!(batch = batch_seq, records, error = %e, "Batch write failed");
                    }
                }
                BatchOutcome {
                    seq: batch_seq,
                    records,
                    result,
                }
            });
            handles.push(handle);
        }

        // Draining: no new writers; wait for every launched writer.
        let outcomes = join_all(handles).await;

        let mut batches_succeeded: u64 = 0;
        let mut batches_failed: u64 = 0;
        let mut records_written: u64 = 0;
        let mut first_failure: Option<(u64, LoaderError)> = None;

        for outcome in outcomes {
            match outcome {
                Ok(BatchOutcome {
                    records,
                    result: Ok(()),
                    ..
                }) => {
                    batches_succeeded += 1;
                    records_written += records as u64;
                }
                Ok(BatchOutcome {
                    seq, result: Err(e), ..
                }) => {
                    batches_failed += 1;
                    if first_failure.is_none() {
                        first_failure = Some((seq, e));
                    }
                }
                Err(join_error) => {
                    batches_failed += 1;
                    error!(error = %join_error, "Batch writer task panicked");
                    if first_failure.is_none() {
                        first_failure = Some((
                            0,
                            LoaderError::Internal(format!("batch writer panicked: {join_error}")),
                        ));
                    }
                }
            }
        }

        let report = IngestReport {
            batches_dispatched: seq,
            batches_succeeded,
            batches_failed,
            records_dispatched,
            records_written,
            lines_skipped: batches.lines_skipped(),
        };

        if let Some(e) = decode_error {
            error!(
                error = %e,
                batches_dispatched = report.batches_dispatched,
                batches_succeeded = report.batches_succeeded,
                "Ingest aborted on malformed input"
            );
            return Err(e);
        }

        if self.ingest.on_write_error == WriteErrorPolicy::FailFast {
            if let Some((failed_seq, e)) = first_failure {
                error!(
                    batch = failed_seq,
                    error = %e,
                    batches_dispatched = report.batches_dispatched,
                    batches_succeeded = report.batches_succeeded,
                    "Ingest aborted after batch failure"
                );
                return Err(e);
            }
        }

        if report.batches_failed > 0 {
            warn!(
                batches = report.batches_dispatched,
                failed = report.batches_failed,
                records = report.records_written,
                "All batches processed, with failures"
            );
        } else {
            info!(
                batches = report.batches_dispatched,
                records = report.records_written,
                skipped = report.lines_skipped,
                "All batches processed"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::EdgeRecord;
    use async_trait::async_trait;
    use std::io::Cursor;

    /// Store double that fails the test if any write reaches it.
    struct UnreachableStore;

    #[async_trait]
    impl RelationshipStore for UnreachableStore {
        async fn write_edges(&self, _edges: &[EdgeRecord]) -> LoaderResult<()> {
            panic!("no write call expected");
        }
    }

    #[tokio::test]
    async fn test_empty_input_completes_without_writes() {
        let pipeline = IngestPipeline::new(Arc::new(UnreachableStore), IngestConfig::default());
        let report = pipeline.run(Cursor::new(Vec::new())).await.unwrap();
        assert_eq!(report, IngestReport::default());
    }
}
