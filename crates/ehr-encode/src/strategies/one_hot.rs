use ehr_model::{ArchivedColumn, Value};

use super::{Category, EncodedBlock, encoded_name};

/// One 0/1 indicator column per observed category; missing rows are all zero.
pub(super) fn encode(input: &ArchivedColumn) -> EncodedBlock {
    let categories = Category::sorted(&input.values);
    let row_categories: Vec<Option<Category>> = input.values.iter().map(Category::of).collect();

    let mut columns = Vec::with_capacity(categories.len());
    let mut names = Vec::with_capacity(categories.len());
    for category in &categories {
        let column = row_categories
            .iter()
            .map(|row| Value::number(if row.as_ref() == Some(category) { 1.0 } else { 0.0 }))
            .collect();
        columns.push(column);
        names.push(encoded_name(&[&input.name, &category.to_string()]));
    }
    EncodedBlock { columns, names }
}
