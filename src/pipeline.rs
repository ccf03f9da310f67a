//! Producer/consumer ingestion pipeline.
//!
//! Exactly two units of work run concurrently. The producer drives
//! read → classify → segment → coerce and enqueues finished chunks; the
//! consumer dequeues them and appends to the columnar store. They meet at one
//! capacity-bounded `tokio::sync::mpsc` channel and both run on blocking
//! threads, so a full queue parks the producer and an empty one parks the
//! consumer. There is no polling and no timing anywhere in the protocol.
//!
//! # Shutdown protocol
//!
//! The producer always enqueues [`StoreMessage::Finish`] after its last data
//! chunk: on normal end of input, on cancellation, and on its own failure
//! alike. The channel is FIFO with a single producer, so by the time the
//! consumer sees the sentinel every prior chunk has already been appended;
//! it finalizes the store and returns. The consumer never terminates on a
//! timeout. If the channel closes without a sentinel the consumer reports
//! [`IngestError::QueueClosed`], which always means a peer died abnormally.
//!
//! A store failure travels the other way: the consumer returns, its receiver
//! drops, the producer's next send fails and the read loop stops.

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::f14::classify::classify;
use crate::f14::coerce::coerce_particle;
use crate::f14::segment::EventSegmenter;
use crate::f14::source::LineBatches;
use crate::record::RowChunk;
use crate::store::{ArrowStoreWriter, ChunkSink};

/// Message protocol on the chunk queue.
#[derive(Debug)]
pub enum StoreMessage {
    /// One coerced chunk to append behind the previous ones.
    Append(RowChunk),
    /// Completion sentinel: nothing follows, finalize the store.
    Finish,
}

/// Cooperative cancellation handle for a running pipeline.
///
/// Flipping it makes the producer stop before reading the next batch; chunks
/// already produced still reach the store and the store is still finalized.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the run to wind down at the next batch boundary.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters accumulated by the producer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReaderStats {
    /// Input lines read, of any class.
    pub lines_read: u64,
    /// Lines classified as particle rows.
    pub particle_rows: u64,
    /// Particle rows dropped by coercion.
    pub rows_dropped: u64,
    /// Coerced rows handed to the queue.
    pub rows_emitted: u64,
    /// Chunks handed to the queue.
    pub chunks_sent: u64,
    /// Events begun.
    pub events_seen: u64,
    /// Particle rows seen before the first event header.
    pub orphan_rows: u64,
    /// Whether the run ended on a stop request instead of end of input.
    pub cancelled: bool,
}

/// Counters accumulated by the consumer.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreStats {
    /// Chunks appended to the store.
    pub chunks_appended: u64,
    /// Rows appended to the store.
    pub rows_appended: u64,
}

/// End-of-run report, merged from both sides of the queue.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    /// Input lines read, of any class.
    pub lines_read: u64,
    /// Lines classified as particle rows.
    pub particle_rows: u64,
    /// Particle rows dropped by coercion.
    pub rows_dropped: u64,
    /// Rows committed to the store.
    pub rows_written: u64,
    /// Batches committed to the store.
    pub chunks_written: u64,
    /// Events observed.
    pub events_seen: u64,
    /// Particle rows seen before the first event header.
    pub orphan_rows: u64,
    /// Whether the run was cooperatively cancelled.
    pub cancelled: bool,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    fn merge(reader: ReaderStats, store: StoreStats, elapsed: Duration) -> Self {
        Self {
            lines_read: reader.lines_read,
            particle_rows: reader.particle_rows,
            rows_dropped: reader.rows_dropped,
            rows_written: store.rows_appended,
            chunks_written: store.chunks_appended,
            events_seen: reader.events_seen,
            orphan_rows: reader.orphan_rows,
            cancelled: reader.cancelled,
            elapsed,
        }
    }
}

/// Orchestrator wiring the reader to the columnar store.
pub struct IngestPipeline {
    config: IngestConfig,
    stop: Arc<AtomicBool>,
}

impl IngestPipeline {
    /// Builds a pipeline from validated configuration.
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for cooperative cancellation, safe to clone across tasks.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Ingests an event-log file into a new store file.
    pub async fn ingest_file(self, input: &Path, output: &Path) -> IngestResult<RunSummary> {
        let reader = std::io::BufReader::new(std::fs::File::open(input)?);
        let sink = ArrowStoreWriter::create(output, self.config.store.include_event_columns)?;
        info!(
            input = %input.display(),
            output = %output.display(),
            chunk_lines = self.config.reader.chunk_lines,
            queue_capacity = self.config.reader.queue_capacity,
            "ingestion started"
        );
        self.run(reader, sink).await
    }

    /// Runs the pipeline over any reader and sink.
    ///
    /// This is the whole machine; [`Self::ingest_file`] only supplies the
    /// file-backed ends. Consumes the pipeline: a second run needs a new one.
    pub async fn run<R, S>(self, reader: R, sink: S) -> IngestResult<RunSummary>
    where
        R: BufRead + Send + 'static,
        S: ChunkSink + 'static,
    {
        let started = Instant::now();
        let (tx, rx) = mpsc::channel(self.config.reader.queue_capacity);
        let chunk_lines = self.config.reader.chunk_lines;
        let stop = Arc::clone(&self.stop);

        let producer = task::spawn_blocking(move || produce(reader, chunk_lines, &stop, tx));
        let consumer = task::spawn_blocking(move || consume(rx, sink));

        let (produced, consumed) = tokio::join!(producer, consumer);
        let produced = produced.map_err(|e| IngestError::Worker(format!("reader task: {e}")))?;
        let consumed = consumed.map_err(|e| IngestError::Worker(format!("store task: {e}")))?;

        match (produced, consumed) {
            (Ok(reader_stats), Ok(store_stats)) => {
                let summary = RunSummary::merge(reader_stats, store_stats, started.elapsed());
                info!(
                    lines = summary.lines_read,
                    rows = summary.rows_written,
                    dropped = summary.rows_dropped,
                    events = summary.events_seen,
                    cancelled = summary.cancelled,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "ingestion finished"
                );
                Ok(summary)
            }
            // A dead store usually also trips the producer (its sends start
            // failing), so the store error is the root cause to report.
            (_, Err(store_err)) => Err(store_err),
            (Err(reader_err), Ok(_)) => Err(reader_err),
        }
    }
}

fn produce<R: BufRead>(
    reader: R,
    chunk_lines: usize,
    stop: &AtomicBool,
    tx: Sender<StoreMessage>,
) -> IngestResult<ReaderStats> {
    let mut stats = ReaderStats::default();
    let result = read_into_queue(reader, chunk_lines, stop, &tx, &mut stats);
    // The sentinel goes out unconditionally, so the consumer drains what was
    // queued and finalizes the store no matter how this side ended.
    if tx.blocking_send(StoreMessage::Finish).is_err() {
        debug!("consumer gone before the completion marker could be sent");
    }
    result.map(|()| stats)
}

fn read_into_queue<R: BufRead>(
    reader: R,
    chunk_lines: usize,
    stop: &AtomicBool,
    tx: &Sender<StoreMessage>,
    stats: &mut ReaderStats,
) -> IngestResult<()> {
    let mut source = LineBatches::new(reader, chunk_lines);
    let mut segmenter = EventSegmenter::new();
    let mut next_chunk = 0u64;

    loop {
        if stop.load(Ordering::SeqCst) {
            stats.cancelled = true;
            warn!("stop requested; ending the read at a batch boundary");
            break;
        }
        let Some(lines) = source.next_batch()? else {
            break;
        };

        let mut chunk = RowChunk::with_capacity(next_chunk, lines.len());
        for line in &lines {
            stats.lines_read += 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(tag) = segmenter.advance(classify(&tokens)) else {
                continue;
            };
            stats.particle_rows += 1;
            match coerce_particle(&tokens, tag) {
                Ok(record) => chunk.rows.push(record),
                Err(reason) => {
                    stats.rows_dropped += 1;
                    debug!(line = %line, %reason, "dropped particle row");
                }
            }
        }
        if chunk.is_empty() {
            continue;
        }
        stats.rows_emitted += chunk.len() as u64;
        stats.chunks_sent += 1;
        next_chunk += 1;
        if tx.blocking_send(StoreMessage::Append(chunk)).is_err() {
            return Err(IngestError::QueueClosed);
        }
    }
    stats.events_seen = segmenter.events_begun();
    stats.orphan_rows = segmenter.orphan_rows();
    Ok(())
}

fn consume<S: ChunkSink>(mut rx: Receiver<StoreMessage>, mut sink: S) -> IngestResult<StoreStats> {
    let mut stats = StoreStats::default();
    while let Some(message) = rx.blocking_recv() {
        match message {
            StoreMessage::Append(chunk) => {
                if let Err(err) = sink.append(&chunk) {
                    // Returning drops the receiver, which unblocks the
                    // producer and stops the read loop.
                    return Err(attach_progress(err, stats.chunks_appended));
                }
                stats.chunks_appended += 1;
                stats.rows_appended += chunk.len() as u64;
                debug!(chunk = chunk.index, rows = chunk.len(), "chunk appended");
            }
            StoreMessage::Finish => {
                sink.finish()?;
                return Ok(stats);
            }
        }
    }
    Err(IngestError::QueueClosed)
}

fn attach_progress(err: IngestError, chunks_appended: u64) -> IngestError {
    match err {
        IngestError::Store(source) => IngestError::StoreWrite {
            chunks_appended,
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_handle_is_shared_across_clones() {
        let pipeline = IngestPipeline::new(IngestConfig::default());
        let a = pipeline.stop_handle();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
        assert!(pipeline.stop_handle().is_stopped());
    }

    #[test]
    fn store_errors_gain_progress_context() {
        let err = attach_progress(
            IngestError::Store(arrow::error::ArrowError::IpcError("footer".into())),
            3,
        );
        match err {
            IngestError::StoreWrite {
                chunks_appended, ..
            } => assert_eq!(chunks_appended, 3),
            other => panic!("unexpected: {other:?}"),
        }

        // Non-Arrow errors pass through untouched.
        let err = attach_progress(IngestError::StoreFinalized, 9);
        assert!(matches!(err, IngestError::StoreFinalized));
    }
}
