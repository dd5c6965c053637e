//! Reading and writing annotated EHR tables.
//!
//! CSV files are read through polars and split into the data matrix and
//! observation annotations. Tables are persisted as JSON archives that keep
//! layers, typed annotation columns and the encoding history.

pub mod archive;
mod frame;
pub mod ingest;

pub use archive::{ARCHIVE_FORMAT_VERSION, read_archive, write_archive};
pub use ingest::{IngestOptions, read_csv, table_from_frame};
