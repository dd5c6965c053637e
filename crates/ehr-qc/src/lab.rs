//! Lookup of lab measurements against clinical reference intervals.

use std::collections::BTreeMap;

use ehr_model::{AnnotatedTable, Value};
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QcError, Result};
use crate::matcher::StrMatcher;
use crate::reference::{ReferenceTable, ReferenceUnit};

/// Minimum bigram similarity for a measurement to match a reference name.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.2;

/// Options for [`qc_lab_measurements`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabQcOptions {
    pub unit: ReferenceUnit,
    /// Layer holding the measured values; `None` uses `x`.
    pub layer: Option<String>,
    pub threshold: f64,
}

impl Default for LabQcOptions {
    fn default() -> Self {
        Self {
            unit: ReferenceUnit::Si,
            layer: None,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl LabQcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: ReferenceUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// One measured variable paired with its matched reference interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabMeasurementCheck {
    pub measurement: String,
    pub reference: String,
    pub score: f64,
    pub reference_interval: String,
    pub values: Vec<Value>,
}

/// Decides whether a single value lies inside a reference interval.
///
/// `None` means the value could not be judged (missing value or an interval
/// the policy does not understand).
pub trait ReferenceRangeCheck {
    fn within(&self, interval: &str, value: &Value) -> Option<bool>;
}

impl<F> ReferenceRangeCheck for F
where
    F: Fn(&str, &Value) -> Option<bool>,
{
    fn within(&self, interval: &str, value: &Value) -> Option<bool> {
        self(interval, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabQcReport {
    pub unit: ReferenceUnit,
    pub checks: Vec<LabMeasurementCheck>,
}

impl LabQcReport {
    pub fn get(&self, measurement: &str) -> Option<&LabMeasurementCheck> {
        self.checks.iter().find(|c| c.measurement == measurement)
    }

    /// Applies `policy` to every value, keyed by measurement.
    pub fn evaluate_with<C>(&self, policy: &C) -> BTreeMap<String, Vec<Option<bool>>>
    where
        C: ReferenceRangeCheck + ?Sized,
    {
        self.checks
            .iter()
            .map(|check| {
                let verdicts = check
                    .values
                    .iter()
                    .map(|value| policy.within(&check.reference_interval, value))
                    .collect();
                (check.measurement.clone(), verdicts)
            })
            .collect()
    }
}

/// Matches each measurement to a reference interval and collects its values.
///
/// Uses the bundled reference table when `reference` is `None`. The table is
/// only read; nothing is written back to it.
pub fn qc_lab_measurements(
    table: &AnnotatedTable,
    reference: Option<&ReferenceTable>,
    measurements: &[String],
    options: &LabQcOptions,
) -> Result<LabQcReport> {
    let bundled;
    let reference = match reference {
        Some(reference) => reference,
        None => {
            bundled = ReferenceTable::bundled()?;
            &bundled
        }
    };
    let matrix = table
        .matrix(options.layer.as_deref())
        .ok_or_else(|| QcError::LayerNotFound(options.layer.clone().unwrap_or_default()))?;
    let matcher = StrMatcher::new(reference.measurements());

    let mut checks = Vec::with_capacity(measurements.len());
    for measurement in measurements {
        let idx = table
            .var_index(measurement)
            .ok_or_else(|| QcError::MeasurementNotFound(measurement.clone()))?;
        let no_match = || QcError::NoReferenceMatch {
            measurement: measurement.clone(),
            threshold: options.threshold,
        };
        let hit = matcher
            .best_match(measurement, options.threshold)
            .ok_or_else(no_match)?;
        let range = reference.get(&hit.reference).ok_or_else(no_match)?;
        debug!(
            measurement = %measurement,
            reference = %hit.reference,
            score = hit.score,
            "matched lab measurement"
        );
        checks.push(LabMeasurementCheck {
            measurement: measurement.clone(),
            reference: hit.reference,
            score: hit.score,
            reference_interval: range.interval(options.unit).to_string(),
            values: matrix.index_axis(Axis(1), idx).to_vec(),
        });
    }

    info!(measurements = checks.len(), "looked up lab reference intervals");
    Ok(LabQcReport {
        unit: options.unit,
        checks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labs() -> AnnotatedTable {
        AnnotatedTable::from_columns([
            ("sodium", vec![Value::number(140.0), Value::number(150.0), Value::Missing]),
            ("potassium", vec![Value::number(4.1), Value::number(3.0), Value::number(5.5)]),
        ])
        .expect("table")
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn matches_bundled_reference() {
        let report =
            qc_lab_measurements(&labs(), None, &names(&["sodium"]), &LabQcOptions::new())
                .expect("report");
        let check = report.get("sodium").expect("sodium");
        assert_eq!(check.reference, "Sodium");
        assert_eq!(check.reference_interval, "136-146 mmol/L");
        assert_eq!(check.values.len(), 3);
        assert!(check.values[2].is_missing());
    }

    #[test]
    fn traditional_units() {
        let options = LabQcOptions::new().with_unit(ReferenceUnit::Traditional);
        let report =
            qc_lab_measurements(&labs(), None, &names(&["potassium"]), &options).expect("report");
        assert_eq!(report.checks[0].reference_interval, "3.5-5.0 meq/L");
        assert_eq!(report.unit, ReferenceUnit::Traditional);
    }

    #[test]
    fn unknown_measurement_and_layer() {
        let err = qc_lab_measurements(&labs(), None, &names(&["lactate"]), &LabQcOptions::new())
            .unwrap_err();
        assert!(matches!(err, QcError::MeasurementNotFound(m) if m == "lactate"));

        let options = LabQcOptions::new().with_layer("raw");
        let err =
            qc_lab_measurements(&labs(), None, &names(&["sodium"]), &options).unwrap_err();
        assert!(matches!(err, QcError::LayerNotFound(_)));
    }

    #[test]
    fn weak_match_is_rejected() {
        let options = LabQcOptions::new().with_threshold(1.01);
        let err =
            qc_lab_measurements(&labs(), None, &names(&["potassium"]), &options).unwrap_err();
        assert!(matches!(err, QcError::NoReferenceMatch { measurement, .. } if measurement == "potassium"));
    }

    #[test]
    fn policies_see_interval_and_value() {
        let report = qc_lab_measurements(
            &labs(),
            None,
            &names(&["sodium"]),
            &LabQcOptions::new(),
        )
        .expect("report");
        let sodium = |interval: &str, value: &Value| {
            assert!(interval.starts_with("136-146"));
            value.as_f64().map(|v| (136.0..=146.0).contains(&v))
        };
        let verdicts = report.evaluate_with(&sodium);
        assert_eq!(verdicts["sodium"], vec![Some(true), Some(false), None]);
    }
}
