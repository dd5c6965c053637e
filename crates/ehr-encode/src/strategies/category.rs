use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use ehr_common::format_numeric;
use ehr_model::Value;

/// Distinct category of a categorical column, ordered numbers first.
#[derive(Debug, Clone)]
pub(crate) enum Category {
    Number(f64),
    Text(String),
}

impl Category {
    pub(crate) fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Number(v) if !v.is_nan() => Some(Category::Number(*v)),
            Value::Text(s) => Some(Category::Text(s.clone())),
            _ => None,
        }
    }

    /// Sorted distinct categories of `values`, missing values excluded.
    pub(crate) fn sorted(values: &[Value]) -> Vec<Category> {
        values
            .iter()
            .filter_map(Category::of)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Category::Number(a), Category::Number(b)) => a.total_cmp(b),
            (Category::Number(_), Category::Text(_)) => Ordering::Less,
            (Category::Text(_), Category::Number(_)) => Ordering::Greater,
            (Category::Text(a), Category::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Category {}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Number(v) => f.write_str(&format_numeric(*v)),
            Category::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_skips_missing_and_dedups() {
        let values = vec![
            Value::text("M"),
            Value::Missing,
            Value::text("F"),
            Value::text("M"),
        ];
        let names: Vec<String> = Category::sorted(&values)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["F", "M"]);
    }

    #[test]
    fn numbers_sort_numerically_before_text() {
        let values = vec![
            Value::number(10.0),
            Value::text("a"),
            Value::number(2.0),
        ];
        let names: Vec<String> = Category::sorted(&values)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["2", "10", "a"]);
    }

    #[test]
    fn whitespace_variants_stay_distinct() {
        let values = vec![Value::text("icu"), Value::text("icu "), Value::text("er")];
        let names: Vec<String> = Category::sorted(&values)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["er", "icu", "icu "]);
    }
}
