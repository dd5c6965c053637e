//! Quality control for annotated EHR tables.
//!
//! - [`qc_metrics`] computes missing-value and summary statistics per
//!   observation and per variable.
//! - [`qc_lab_measurements`] pairs lab variables with clinical reference
//!   intervals through approximate name matching.

pub mod error;
pub mod lab;
pub mod matcher;
pub mod metrics;
pub mod reference;

pub use error::{QcError, Result};
pub use lab::{
    DEFAULT_MATCH_THRESHOLD, LabMeasurementCheck, LabQcOptions, LabQcReport, ReferenceRangeCheck,
    qc_lab_measurements,
};
pub use matcher::{StrMatch, StrMatcher};
pub use metrics::{QcMetricsOptions, qc_metrics};
pub use reference::{BUNDLED_REFERENCE_RANGES, ReferenceRange, ReferenceTable, ReferenceUnit};
