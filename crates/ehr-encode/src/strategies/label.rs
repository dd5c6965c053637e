use ehr_model::{ArchivedColumn, Value};

use super::{Category, EncodedBlock, encoded_name};

/// Replaces each category with its rank among the sorted categories.
pub(super) fn encode(input: &ArchivedColumn) -> EncodedBlock {
    let categories = Category::sorted(&input.values);
    let column = input
        .values
        .iter()
        .map(|value| {
            Category::of(value)
                .and_then(|category| categories.binary_search(&category).ok())
                .map_or(Value::Missing, |code| Value::number(code as f64))
        })
        .collect();
    EncodedBlock {
        columns: vec![column],
        names: vec![encoded_name(&[&input.name])],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_sorted_order() {
        let input = ArchivedColumn {
            name: "sex".into(),
            values: vec![
                Value::text("M"),
                Value::text("F"),
                Value::Missing,
                Value::text("F"),
            ],
        };
        let block = encode(&input);
        assert_eq!(block.names, vec!["ehrcat_sex"]);
        assert_eq!(
            block.columns[0],
            vec![
                Value::number(1.0),
                Value::number(0.0),
                Value::Missing,
                Value::number(0.0)
            ]
        );
    }
}
