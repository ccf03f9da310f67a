//! Error types for the ingestion pipeline.
//!
//! This module defines the primary error type, `IngestError`, used across the
//! library. Using the `thiserror` crate, it gives every fatal failure mode of a
//! run a distinct variant, so callers can tell an input problem from a store
//! problem without string matching.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from the `figment` crate, typically file parsing
//!   or format issues in the configuration sources.
//! - **`Configuration`**: Semantic errors in the configuration, such as values
//!   that parse fine but are logically invalid (a zero chunk size, an unknown
//!   log level). Caught during the validation step.
//! - **`Io`**: Wraps `std::io::Error` for input-file reads and store-file
//!   creation.
//! - **`Store`** / **`StoreWrite`**: Arrow-level failures. `StoreWrite` is the
//!   append path specifically and records how many chunks had already been
//!   committed, which is the first question anyone asks about a dead run.
//! - **`StoreFinalized`**: An append arrived after the store footer was
//!   written. Always a protocol bug in the caller, never an input problem.
//! - **`QueueClosed`**: The chunk queue closed before the completion marker was
//!   observed, meaning one side of the pipeline vanished without running the
//!   shutdown protocol.
//! - **`Worker`**: A pipeline worker thread terminated abnormally.
//!
//! Per-row coercion failures are deliberately *not* here: they are recoverable
//! by design (drop the row, count it) and live in
//! [`crate::f14::coerce::CoercionError`].

use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Fatal failure modes of an ingestion run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Columnar store error: {0}")]
    Store(#[from] arrow::error::ArrowError),

    #[error("Store append failed after {chunks_appended} committed chunks: {source}")]
    StoreWrite {
        chunks_appended: u64,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("Store is already finalized; no further appends are accepted")]
    StoreFinalized,

    #[error("Chunk queue closed before the completion marker was observed")]
    QueueClosed,

    #[error("Pipeline worker failed: {0}")]
    Worker(String),
}
