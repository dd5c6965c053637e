//! Clinical reference intervals for lab measurements.
//!
//! The bundled table is compiled into the crate; callers may load their own
//! tab-separated table with the same header.

use std::io::{Cursor, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};

/// Bundled reference ranges for adults.
pub const BUNDLED_REFERENCE_RANGES: &str = include_str!("../data/reference_ranges.tsv");

/// Row of a reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    #[serde(rename = "Measurement")]
    pub measurement: String,
    #[serde(rename = "SI Reference Interval")]
    pub si: String,
    #[serde(rename = "Traditional Reference Interval")]
    pub traditional: String,
}

/// Unit system of a reference interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceUnit {
    #[default]
    #[serde(rename = "SI")]
    Si,
    #[serde(rename = "traditional")]
    Traditional,
}

impl ReferenceRange {
    pub fn interval(&self, unit: ReferenceUnit) -> &str {
        match unit {
            ReferenceUnit::Si => &self.si,
            ReferenceUnit::Traditional => &self.traditional,
        }
    }
}

/// Reference intervals indexed by measurement name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    ranges: Vec<ReferenceRange>,
}

impl ReferenceTable {
    /// Loads the bundled table.
    pub fn bundled() -> Result<Self> {
        Self::from_reader(
            Cursor::new(BUNDLED_REFERENCE_RANGES.as_bytes()),
            "bundled reference ranges",
        )
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| QcError::ReferenceTable {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Parses a tab-separated table with `Measurement`,
    /// `SI Reference Interval` and `Traditional Reference Interval` columns.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut ranges = Vec::new();
        for result in reader.deserialize::<ReferenceRange>() {
            let row = result.map_err(|e| QcError::ReferenceTable {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
            if row.measurement.is_empty() {
                continue;
            }
            ranges.push(row);
        }
        Ok(Self { ranges })
    }

    pub fn from_ranges(ranges: Vec<ReferenceRange>) -> Self {
        Self { ranges }
    }

    pub fn get(&self, measurement: &str) -> Option<&ReferenceRange> {
        self.ranges.iter().find(|r| r.measurement == measurement)
    }

    pub fn measurements(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|r| r.measurement.as_str())
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
