use std::collections::BTreeMap;

use ehr_model::{ArchivedColumn, Value};

use super::{Category, EncodedBlock, encoded_name};

/// Replaces each category with the number of rows holding it.
pub(super) fn encode(input: &ArchivedColumn) -> EncodedBlock {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for category in input.values.iter().filter_map(Category::of) {
        *counts.entry(category).or_default() += 1;
    }
    let column = input
        .values
        .iter()
        .map(|value| {
            Category::of(value)
                .and_then(|category| counts.get(&category))
                .map_or(Value::Missing, |count| Value::number(*count as f64))
        })
        .collect();
    EncodedBlock {
        columns: vec![column],
        names: vec![encoded_name(&[&input.name])],
    }
}
