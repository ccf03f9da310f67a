//! Arrow IPC columnar store for coerced particle records.
//!
//! One [`ArrowStoreWriter`] owns the output file for the whole run. Every
//! appended [`RowChunk`] becomes one Arrow `RecordBatch`, written through a
//! single IPC `FileWriter` that stays open until [`ChunkSink::finish`] writes
//! the footer. The format is append-only: batches land behind each other in
//! arrival order and nothing is ever rewritten.
//!
//! # Shutdown contract
//!
//! - `finish` is idempotent: the first call closes the file, later calls are
//!   no-ops.
//! - `append` after `finish` fails with [`IngestError::StoreFinalized`].
//! - Dropping an unfinished writer finalizes the file as a last resort, so an
//!   aborted run still leaves a readable store for the batches it committed.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Builder, Int16Builder, Int32Builder, Int8Builder, UInt32Array,
    UInt32Builder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use tracing::{debug, warn};

use crate::error::{IngestError, IngestResult};
use crate::record::{ParticleRecord, RowChunk};

/// Destination for coerced chunks.
///
/// The pipeline's consumer is written against this trait so tests can swap
/// the Arrow writer for an in-memory sink.
pub trait ChunkSink: Send {
    /// Appends one chunk behind all previously appended ones.
    fn append(&mut self, chunk: &RowChunk) -> IngestResult<()>;

    /// Finalizes the store. Idempotent.
    fn finish(&mut self) -> IngestResult<()>;
}

/// Builds the store schema: the 15 particle fields, plus the two event
/// columns when enabled, plus provenance metadata.
pub fn particle_schema(include_event_columns: bool) -> SchemaRef {
    let mut fields = vec![
        Field::new("r0", DataType::Float32, false),
        Field::new("rx", DataType::Float32, false),
        Field::new("ry", DataType::Float32, false),
        Field::new("rz", DataType::Float32, false),
        Field::new("p0", DataType::Float32, false),
        Field::new("px", DataType::Float32, false),
        Field::new("py", DataType::Float32, false),
        Field::new("pz", DataType::Float32, false),
        Field::new("m", DataType::Float32, false),
        Field::new("ityp", DataType::Int16, false),
        Field::new("iso", DataType::Int8, false),
        Field::new("chg", DataType::Int8, false),
        Field::new("lcl", DataType::UInt32, false),
        Field::new("ncl", DataType::UInt32, false),
        Field::new("coll", DataType::Int32, false),
    ];
    if include_event_columns {
        fields.push(Field::new("event_id", DataType::UInt32, false));
        fields.push(Field::new("event_impact_parameter", DataType::Float32, false));
    }
    let metadata = HashMap::from([
        ("source_format".to_owned(), "urqmd-f14".to_owned()),
        (
            "created_by".to_owned(),
            format!("urqmd-ingest {}", env!("CARGO_PKG_VERSION")),
        ),
        ("created_at".to_owned(), chrono::Utc::now().to_rfc3339()),
    ]);
    Arc::new(Schema::new_with_metadata(fields, metadata))
}

/// Per-column builders for one outgoing `RecordBatch`.
struct ColumnBuffers {
    r0: Float32Builder,
    rx: Float32Builder,
    ry: Float32Builder,
    rz: Float32Builder,
    p0: Float32Builder,
    px: Float32Builder,
    py: Float32Builder,
    pz: Float32Builder,
    m: Float32Builder,
    ityp: Int16Builder,
    iso: Int8Builder,
    chg: Int8Builder,
    lcl: UInt32Builder,
    ncl: UInt32Builder,
    coll: Int32Builder,
    event_id: UInt32Builder,
    event_impact_parameter: Float32Builder,
}

impl ColumnBuffers {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            r0: Float32Builder::with_capacity(capacity),
            rx: Float32Builder::with_capacity(capacity),
            ry: Float32Builder::with_capacity(capacity),
            rz: Float32Builder::with_capacity(capacity),
            p0: Float32Builder::with_capacity(capacity),
            px: Float32Builder::with_capacity(capacity),
            py: Float32Builder::with_capacity(capacity),
            pz: Float32Builder::with_capacity(capacity),
            m: Float32Builder::with_capacity(capacity),
            ityp: Int16Builder::with_capacity(capacity),
            iso: Int8Builder::with_capacity(capacity),
            chg: Int8Builder::with_capacity(capacity),
            lcl: UInt32Builder::with_capacity(capacity),
            ncl: UInt32Builder::with_capacity(capacity),
            coll: Int32Builder::with_capacity(capacity),
            event_id: UInt32Builder::with_capacity(capacity),
            event_impact_parameter: Float32Builder::with_capacity(capacity),
        }
    }

    fn append(&mut self, rec: &ParticleRecord) {
        self.r0.append_value(rec.r0);
        self.rx.append_value(rec.rx);
        self.ry.append_value(rec.ry);
        self.rz.append_value(rec.rz);
        self.p0.append_value(rec.p0);
        self.px.append_value(rec.px);
        self.py.append_value(rec.py);
        self.pz.append_value(rec.pz);
        self.m.append_value(rec.m);
        self.ityp.append_value(rec.ityp);
        self.iso.append_value(rec.iso);
        self.chg.append_value(rec.chg);
        self.lcl.append_value(rec.lcl);
        self.ncl.append_value(rec.ncl);
        self.coll.append_value(rec.coll);
        self.event_id.append_value(rec.event_id);
        self.event_impact_parameter
            .append_value(rec.event_impact_parameter);
    }

    fn into_columns(mut self, include_event_columns: bool) -> Vec<ArrayRef> {
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(self.r0.finish()),
            Arc::new(self.rx.finish()),
            Arc::new(self.ry.finish()),
            Arc::new(self.rz.finish()),
            Arc::new(self.p0.finish()),
            Arc::new(self.px.finish()),
            Arc::new(self.py.finish()),
            Arc::new(self.pz.finish()),
            Arc::new(self.m.finish()),
            Arc::new(self.ityp.finish()),
            Arc::new(self.iso.finish()),
            Arc::new(self.chg.finish()),
            Arc::new(self.lcl.finish()),
            Arc::new(self.ncl.finish()),
            Arc::new(self.coll.finish()),
        ];
        if include_event_columns {
            columns.push(Arc::new(self.event_id.finish()));
            columns.push(Arc::new(self.event_impact_parameter.finish()));
        }
        columns
    }
}

/// Arrow IPC writer owning the store file for one ingestion run.
pub struct ArrowStoreWriter {
    /// `None` once finalized.
    writer: Option<FileWriter<File>>,
    schema: SchemaRef,
    include_event_columns: bool,
    path: PathBuf,
    rows_written: u64,
    batches_written: u64,
}

impl ArrowStoreWriter {
    /// Creates the store file and writes the schema header.
    pub fn create(path: &Path, include_event_columns: bool) -> IngestResult<Self> {
        let schema = particle_schema(include_event_columns);
        let file = File::create(path)?;
        let writer = FileWriter::try_new(file, &schema)?;
        debug!(path = %path.display(), "columnar store created");
        Ok(Self {
            writer: Some(writer),
            schema,
            include_event_columns,
            path: path.to_path_buf(),
            rows_written: 0,
            batches_written: 0,
        })
    }

    /// Where the store lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Batches appended so far.
    pub fn batches_written(&self) -> u64 {
        self.batches_written
    }

    fn chunk_to_batch(&self, chunk: &RowChunk) -> Result<RecordBatch, ArrowError> {
        let mut buffers = ColumnBuffers::with_capacity(chunk.rows.len());
        for row in &chunk.rows {
            buffers.append(row);
        }
        RecordBatch::try_new(
            self.schema.clone(),
            buffers.into_columns(self.include_event_columns),
        )
    }
}

impl ChunkSink for ArrowStoreWriter {
    fn append(&mut self, chunk: &RowChunk) -> IngestResult<()> {
        if self.writer.is_none() {
            return Err(IngestError::StoreFinalized);
        }
        if chunk.is_empty() {
            return Ok(());
        }
        let batch = self.chunk_to_batch(chunk)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.write(&batch)?;
        }
        self.rows_written += chunk.rows.len() as u64;
        self.batches_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> IngestResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.finish()?;
            debug!(
                path = %self.path.display(),
                rows = self.rows_written,
                batches = self.batches_written,
                "columnar store finalized"
            );
        }
        Ok(())
    }
}

impl Drop for ArrowStoreWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            match writer.finish() {
                Ok(()) => warn!(
                    path = %self.path.display(),
                    "store writer dropped without finish; finalized on drop"
                ),
                Err(err) => warn!(
                    path = %self.path.display(),
                    error = %err,
                    "store writer dropped without finish and finalization failed"
                ),
            }
        }
    }
}

/// Reads every batch of a finalized store.
pub fn read_store(path: &Path) -> IngestResult<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = FileReader::try_new(file, None)?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Shape report of a finalized store, for the `inspect` command and tests.
#[derive(Clone, Debug)]
pub struct StoreSummary {
    /// Total rows across all batches.
    pub rows: u64,
    /// Number of appended batches.
    pub batches: u64,
    /// Column names and types, in schema order.
    pub fields: Vec<(String, String)>,
    /// Distinct event ids, when the store carries the event column.
    pub events: Option<u64>,
}

/// Reopens a finalized store and reports its shape.
pub fn summarize_store(path: &Path) -> IngestResult<StoreSummary> {
    let file = File::open(path)?;
    let reader = FileReader::try_new(file, None)?;
    let schema = reader.schema();
    let fields = schema
        .fields()
        .iter()
        .map(|f| (f.name().clone(), f.data_type().to_string()))
        .collect();
    let event_column = schema.index_of("event_id").ok();

    let mut rows = 0u64;
    let mut batches = 0u64;
    let mut event_ids = std::collections::HashSet::new();
    for batch in reader {
        let batch = batch?;
        rows += batch.num_rows() as u64;
        batches += 1;
        if let Some(idx) = event_column {
            let ids = batch
                .column(idx)
                .as_any()
                .downcast_ref::<UInt32Array>()
                .ok_or_else(|| {
                    ArrowError::SchemaError("event_id column is not UInt32".to_owned())
                })?;
            for i in 0..ids.len() {
                event_ids.insert(ids.value(i));
            }
        }
    }
    Ok(StoreSummary {
        rows,
        batches,
        fields,
        events: event_column.map(|_| event_ids.len() as u64),
    })
}
