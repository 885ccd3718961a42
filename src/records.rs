//! # Record Source and Batcher
//!
//! Streaming decode of a delimited edge list into [`EdgeRecord`] values and
//! size-triggered grouping into write batches.
//!
//! The source is single-pass: once exhausted or aborted it cannot be
//! replayed. No header row is assumed or skipped.

use std::io;
use tracing::warn;

use crate::config::MalformedPolicy;
use crate::error::{LoaderError, LoaderResult};

/// One decoded input line: a directed edge between two entity identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeRecord {
    pub source_id: String,
    pub target_id: String,
}

/// Lazy, single-pass decoder over a delimited byte stream.
///
/// Each well-formed line yields one [`EdgeRecord`] from its first two
/// fields; trailing fields are ignored. A line with fewer than two fields,
/// or one the CSV reader cannot decode, yields a
/// [`LoaderError::MalformedRecord`] carrying the offending line number;
/// end of stream is a distinct, normal termination.
pub struct RecordSource<R> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: io::Read> RecordSource<R> {
    /// Create a source over any byte stream.
    pub fn new(input: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        Self {
            reader,
            record: csv::StringRecord::new(),
        }
    }
}

impl<R: io::Read> Iterator for RecordSource<R> {
    type Item = LoaderResult<EdgeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let line = self.record.position().map_or(0, |p| p.line());
                if self.record.len() < 2 {
                    return Some(Err(LoaderError::malformed_record(
                        line,
                        format!("expected at least two fields, got {}", self.record.len()),
                    )));
                }
                Some(Ok(EdgeRecord {
                    source_id: self.record[0].to_string(),
                    target_id: self.record[1].to_string(),
                }))
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                Some(Err(LoaderError::malformed_record(line, e.to_string())))
            }
        }
    }
}

/// Groups a record stream into ordered batches of at most `batch_size`
/// records, emitting a final partial batch if the source ends mid-batch.
///
/// Batching is purely size-triggered. A source yielding zero records yields
/// zero batches. The malformed-line policy is applied here:
/// [`MalformedPolicy::Skip`] warns and keeps reading;
/// [`MalformedPolicy::Abort`] first flushes the records decoded before the
/// bad line, then surfaces the error and fuses the iterator.
pub struct Batches<I> {
    records: I,
    batch_size: usize,
    on_malformed: MalformedPolicy,
    lines_skipped: u64,
    pending_error: Option<LoaderError>,
    exhausted: bool,
}

impl<I> Batches<I>
where
    I: Iterator<Item = LoaderResult<EdgeRecord>>,
{
    pub fn new(records: I, batch_size: usize, on_malformed: MalformedPolicy) -> Self {
        debug_assert!(batch_size >= 1);
        Self {
            records,
            batch_size,
            on_malformed,
            lines_skipped: 0,
            pending_error: None,
            exhausted: false,
        }
    }

    /// Number of malformed lines dropped under [`MalformedPolicy::Skip`].
    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = LoaderResult<EdgeRecord>>,
{
    type Item = LoaderResult<Vec<EdgeRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending_error.take() {
            self.exhausted = true;
            return Some(Err(e));
        }
        if self.exhausted {
            return None;
        }

        let mut batch = Vec::new();
        loop {
            match self.records.next() {
                Some(Ok(record)) => {
                    batch.push(record);
                    if batch.len() == self.batch_size {
                        return Some(Ok(batch));
                    }
                }
                Some(Err(e)) => match self.on_malformed {
                    MalformedPolicy::Skip => {
                        warn!(error = %e, "Skipping malformed input line");
                        self.lines_skipped += 1;
                    }
                    MalformedPolicy::Abort => {
                        if batch.is_empty() {
                            self.exhausted = true;
                            return Some(Err(e));
                        }
                        self.pending_error = Some(e);
                        return Some(Ok(batch));
                    }
                },
                None => {
                    self.exhausted = true;
                    if batch.is_empty() {
                        return None;
                    }
                    return Some(Ok(batch));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn source(input: &str) -> RecordSource<Cursor<Vec<u8>>> {
        RecordSource::new(Cursor::new(input.as_bytes().to_vec()))
    }

    fn edge(source_id: &str, target_id: &str) -> EdgeRecord {
        EdgeRecord {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
        }
    }

    #[test]
    fn test_decodes_pairs() {
        let records: Vec<_> = source("a,b\nc,d\n").collect::<LoaderResult<_>>().unwrap();
        assert_eq!(records, vec![edge("a", "b"), edge("c", "d")]);
    }

    #[test]
    fn test_trailing_fields_ignored() {
        let records: Vec<_> = source("a,b,extra,more\n").collect::<LoaderResult<_>>().unwrap();
        assert_eq!(records, vec![edge("a", "b")]);
    }

    #[test]
    fn test_single_field_is_malformed() {
        let mut src = source("a,b\nlonely\n");
        assert!(src.next().unwrap().is_ok());
        let err = src.next().unwrap().unwrap_err();
        match err {
            LoaderError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(source("").next().is_none());
    }

    #[test]
    fn test_batches_exact_multiple() {
        let batches: Vec<_> = Batches::new(source("a,b\nc,d\ne,f\ng,h\n"), 2, MalformedPolicy::Abort)
            .collect::<LoaderResult<_>>()
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec![edge("a", "b"), edge("c", "d")]);
        assert_eq!(batches[1], vec![edge("e", "f"), edge("g", "h")]);
    }

    #[test]
    fn test_batches_final_partial() {
        let batches: Vec<_> = Batches::new(source("a,b\nc,d\ne,f\n"), 2, MalformedPolicy::Abort)
            .collect::<LoaderResult<_>>()
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], vec![edge("e", "f")]);
    }

    #[test]
    fn test_empty_source_yields_no_batches() {
        let mut batches = Batches::new(source(""), 10, MalformedPolicy::Abort);
        assert!(batches.next().is_none());
    }

    #[test]
    fn test_skip_policy_counts_malformed_lines() {
        let mut batches = Batches::new(source("a,b\nbad\nc,d\n"), 10, MalformedPolicy::Skip);
        let batch = batches.next().unwrap().unwrap();
        assert_eq!(batch, vec![edge("a", "b"), edge("c", "d")]);
        assert!(batches.next().is_none());
        assert_eq!(batches.lines_skipped(), 1);
    }

    #[test]
    fn test_abort_policy_flushes_then_errors() {
        let mut batches = Batches::new(source("a,b\nbad\nc,d\n"), 10, MalformedPolicy::Abort);
        let batch = batches.next().unwrap().unwrap();
        assert_eq!(batch, vec![edge("a", "b")]);
        assert!(batches.next().unwrap().is_err());
        assert!(batches.next().is_none());
    }

    #[test]
    fn test_abort_policy_immediate_error_on_leading_bad_line() {
        let mut batches = Batches::new(source("bad\na,b\n"), 10, MalformedPolicy::Abort);
        assert!(batches.next().unwrap().is_err());
        assert!(batches.next().is_none());
    }

    proptest! {
        #[test]
        fn prop_batch_count_and_sizes(r in 0usize..300, n in 1usize..40) {
            let records = (0..r).map(|i| {
                Ok(EdgeRecord {
                    source_id: format!("s{i}"),
                    target_id: format!("t{i}"),
                })
            });
            let batches: Vec<_> = Batches::new(records, n, MalformedPolicy::Abort)
                .collect::<LoaderResult<_>>()
                .unwrap();

            prop_assert_eq!(batches.len(), r.div_ceil(n));
            if let Some((last, full)) = batches.split_last() {
                for batch in full {
                    prop_assert_eq!(batch.len(), n);
                }
                let expected_last = if r % n == 0 { n } else { r % n };
                prop_assert_eq!(last.len(), expected_last);
            }
            let total: usize = batches.iter().map(Vec::len).sum();
            prop_assert_eq!(total, r);
        }
    }
}
