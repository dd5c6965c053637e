//! Encoding requests and the resolved per-mode plan.

use std::collections::BTreeSet;

use ehr_model::{ColumnSelection, EncodingHistory, EncodingMode};

use crate::error::{EncodeError, Result};

/// What to encode.
///
/// `Mode` names the strategy applied to autodetected columns; `Columns`
/// assigns explicit columns (or column groups for multi-column modes) to
/// strategies by mode name.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingSpec {
    Mode(String),
    Columns(Vec<(String, Vec<ColumnSelection>)>),
}

impl EncodingSpec {
    pub fn mode(name: impl Into<String>) -> Self {
        EncodingSpec::Mode(name.into())
    }

    /// Builds a column assignment from `(mode name, selections)` pairs.
    pub fn columns<I, S>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<ColumnSelection>)>,
        S: Into<String>,
    {
        EncodingSpec::Columns(
            assignments
                .into_iter()
                .map(|(mode, selections)| (mode.into(), selections))
                .collect(),
        )
    }
}

/// Ordered mode -> selections assignment, validated and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingPlan {
    entries: Vec<(EncodingMode, Vec<ColumnSelection>)>,
}

impl EncodingPlan {
    /// Parses and validates an explicit column assignment.
    pub fn parse(request: &[(String, Vec<ColumnSelection>)]) -> Result<Self> {
        let mut plan = Self::default();
        for (name, selections) in request {
            let mode: EncodingMode = name
                .parse()
                .map_err(|_| EncodeError::UnknownEncoding(name.clone()))?;
            for selection in selections {
                if selection.is_empty() {
                    return Err(EncodeError::InvalidInput(format!(
                        "empty column group for {mode}"
                    )));
                }
                if matches!(selection, ColumnSelection::Group(_)) && !mode.is_multi_column() {
                    return Err(EncodeError::InvalidInput(format!(
                        "{mode} does not accept column groups"
                    )));
                }
                plan.push(mode, selection.clone());
            }
        }
        plan.check_unique()?;
        Ok(plan)
    }

    /// Every column under one mode, each as its own selection.
    pub fn uniform(mode: EncodingMode, columns: &[String]) -> Self {
        let mut plan = Self::default();
        for column in columns {
            plan.push(mode, ColumnSelection::Single(column.clone()));
        }
        plan
    }

    fn push(&mut self, mode: EncodingMode, selection: ColumnSelection) {
        match self.entries.iter_mut().find(|(m, _)| *m == mode) {
            Some((_, selections)) => selections.push(selection),
            None => self.entries.push((mode, vec![selection])),
        }
    }

    pub fn entries(&self) -> &[(EncodingMode, Vec<ColumnSelection>)] {
        &self.entries
    }

    /// All planned columns in plan order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(_, selections)| selections.iter())
            .flat_map(|selection| selection.names().iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for column in self.columns() {
            if !seen.insert(column) {
                return Err(EncodeError::DuplicateColumn(column.to_string()));
            }
        }
        Ok(())
    }

    /// Appends the previous assignments of `history` that this plan does not
    /// override.
    ///
    /// Re-requested columns are removed from their old selection; selections
    /// and modes left empty are dropped.
    pub fn merge_previous(mut self, history: &EncodingHistory) -> Result<Self> {
        let requested: BTreeSet<String> = self.columns().map(str::to_string).collect();
        for (mode, selections) in &history.encoding_to_var {
            for selection in selections {
                let kept = match selection {
                    ColumnSelection::Single(name) if requested.contains(name) => None,
                    ColumnSelection::Single(_) => Some(selection.clone()),
                    ColumnSelection::Group(names) => {
                        let rest: Vec<String> = names
                            .iter()
                            .filter(|name| !requested.contains(*name))
                            .cloned()
                            .collect();
                        (!rest.is_empty()).then_some(ColumnSelection::Group(rest))
                    }
                };
                if let Some(selection) = kept {
                    self.push(*mode, selection);
                }
            }
        }
        self.check_unique()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(&str, Vec<ColumnSelection>)]) -> Vec<(String, Vec<ColumnSelection>)> {
        pairs
            .iter()
            .map(|(mode, sels)| (mode.to_string(), sels.clone()))
            .collect()
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        let err = EncodingPlan::parse(&request(&[("target_encoding", vec!["a".into()])]))
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnknownEncoding(name) if name == "target_encoding"));
    }

    #[test]
    fn parse_rejects_duplicate_claims() {
        let err = EncodingPlan::parse(&request(&[
            ("one_hot_encoding", vec!["sex".into()]),
            ("label_encoding", vec!["sex".into()]),
        ]))
        .unwrap_err();
        assert!(matches!(err, EncodeError::DuplicateColumn(name) if name == "sex"));
    }

    #[test]
    fn parse_rejects_groups_for_single_column_modes() {
        let err = EncodingPlan::parse(&request(&[(
            "label_encoding",
            vec![ColumnSelection::group(["a", "b"])],
        )]))
        .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidInput(_)));
    }

    #[test]
    fn merge_drops_overridden_columns() {
        let mut history = EncodingHistory::default();
        history.record(EncodingMode::Label, "sex".into());
        history.record(EncodingMode::Label, "ward".into());
        history.record(EncodingMode::Hash, ColumnSelection::group(["icd", "atc"]));

        let plan = EncodingPlan::parse(&request(&[(
            "one_hot_encoding",
            vec!["sex".into(), "icd".into()],
        )]))
        .expect("plan")
        .merge_previous(&history)
        .expect("merge");

        assert_eq!(
            plan.entries(),
            &[
                (
                    EncodingMode::OneHot,
                    vec![ColumnSelection::from("sex"), ColumnSelection::from("icd")]
                ),
                (EncodingMode::Label, vec![ColumnSelection::from("ward")]),
                (EncodingMode::Hash, vec![ColumnSelection::group(["atc"])]),
            ]
        );
    }

    #[test]
    fn merge_drops_emptied_modes() {
        let mut history = EncodingHistory::default();
        history.record(EncodingMode::Label, "sex".into());
        let plan = EncodingPlan::parse(&request(&[("count_encoding", vec!["sex".into()])]))
            .expect("plan")
            .merge_previous(&history)
            .expect("merge");
        assert_eq!(
            plan.entries(),
            &[(EncodingMode::Count, vec![ColumnSelection::from("sex")])]
        );
    }
}
