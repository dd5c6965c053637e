use std::collections::BTreeSet;

use ehr_model::{ArchivedColumn, Value};
use sha2::{Digest, Sha256};

use super::{EncodedBlock, encoded_name};
use crate::error::{EncodeError, Result};

/// Number of hash components reserved per column group.
pub const HASH_COMPONENTS: usize = 8;

fn component(value: &Value, components: usize) -> Option<usize> {
    if value.is_missing() {
        return None;
    }
    let digest = Sha256::digest(value.to_string().as_bytes());
    let bucket = digest
        .iter()
        .take(8)
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    Some((bucket % components as u64) as usize)
}

/// Hashes every cell of the group into one of `components` buckets and
/// counts the hits per row.
///
/// Only buckets hit while fitting become output columns, so a group with too
/// few distinct values cannot fill the reserved names and fails.
pub(super) fn encode(inputs: &[&ArchivedColumn], components: usize) -> Result<EncodedBlock> {
    let group: Vec<String> = inputs.iter().map(|col| col.name.clone()).collect();
    let Some(first) = inputs.first() else {
        return Err(EncodeError::InvalidInput(
            "hash encoding needs at least one column".to_string(),
        ));
    };
    let n_obs = first.values.len();
    if let Some(ragged) = inputs.iter().find(|col| col.values.len() != n_obs) {
        return Err(EncodeError::InvalidInput(format!(
            "hash group {group:?} has columns of different length ({} has {}, expected {n_obs})",
            ragged.name,
            ragged.values.len()
        )));
    }

    let mut counts = vec![vec![0.0; n_obs]; components];
    let mut observed = BTreeSet::new();
    for input in inputs {
        for (row, value) in input.values.iter().enumerate() {
            if let Some(bucket) = component(value, components) {
                counts[bucket][row] += 1.0;
                observed.insert(bucket);
            }
        }
    }

    let names: Vec<String> = (0..components)
        .map(|i| encoded_name(&["hash", &first.name, &i.to_string()]))
        .collect();
    let columns: Vec<Vec<Value>> = observed
        .iter()
        .map(|bucket| counts[*bucket].iter().copied().map(Value::number).collect())
        .collect();
    if columns.len() != names.len() {
        return Err(EncodeError::HashEncoding {
            group,
            produced: columns.len(),
            expected: names.len(),
        });
    }
    Ok(EncodedBlock { columns, names })
}
