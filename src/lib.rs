//! # UrQMD Ingest Library
//!
//! This crate ingests the ASCII event logs written by the UrQMD heavy-ion
//! transport simulation ("file 14" output) and materializes them into compact
//! Arrow IPC columnar stores for downstream analysis. Organizing the project
//! as a library keeps the pipeline reusable from the CLI binary, tests, and
//! benchmarks alike.
//!
//! Data flows in one direction: raw lines are pulled in bounded batches,
//! classified, segmented into events, coerced into typed records, and handed
//! across a bounded queue to the store writer. Event blocks may straddle
//! batch boundaries; the segmenter carries the necessary state explicitly.
//!
//! ## Crate Structure
//!
//! The library is organized into focused modules:
//!
//! - **`config`**: Layered configuration (TOML file + environment) with
//!   defaults and validation. See [`config::IngestConfig`].
//! - **`error`**: The [`error::IngestError`] taxonomy for fatal run errors.
//! - **`f14`**: The event-log reader: line classification, event
//!   segmentation, type coercion, and the chunked line source.
//! - **`logging`**: Tracing subscriber setup shared by the binary and tests.
//! - **`pipeline`**: The producer/consumer orchestrator, the queue protocol,
//!   and the end-of-run summary.
//! - **`record`**: The [`record::ParticleRecord`] data model and the
//!   [`record::RowChunk`] unit of transfer.
//! - **`store`**: The Arrow IPC store writer behind the [`store::ChunkSink`]
//!   trait, plus read-back helpers.

pub mod config;
pub mod error;
pub mod f14;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod store;
