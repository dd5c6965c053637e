//! Integration tests for normalizing encoded tables.

use ehr_encode::encode;
use ehr_model::{AnnotatedTable, LAYER_RAW, NormalizationMethod, Value};
use ehr_normalize::{NormalizationSpec, NormalizeError, normalize, numeric_variables};

fn patients() -> AnnotatedTable {
    let mut table = AnnotatedTable::from_columns([
        (
            "age",
            vec![Value::number(25.0), Value::number(30.0), Value::number(40.0)],
        ),
        ("sex", vec![Value::text("M"), Value::text("F"), Value::text("F")]),
        (
            "glucose",
            vec![Value::number(4.8), Value::Missing, Value::number(9.6)],
        ),
    ])
    .expect("table");
    table.uns.numerical_columns = vec!["age".into(), "glucose".into()];
    table.uns.non_numerical_columns = vec!["sex".into()];
    table
}

#[test]
fn unencoded_table_is_rejected_before_mutation() {
    let mut table = patients();
    let before = table.x.clone();
    let err = normalize(&mut table, &NormalizationSpec::all("scale"), false).unwrap_err();
    assert!(matches!(err, NormalizeError::NotEncoded { ref columns } if columns == &["sex"]));
    assert_eq!(table.x, before);
    assert!(table.layers.get(LAYER_RAW).is_none());
    assert!(table.uns.normalization.is_empty());
}

#[test]
fn encoded_columns_are_not_rescaled() {
    let mut encoded = encode(&patients(), true, None).expect("encode");
    assert_eq!(numeric_variables(&encoded), vec!["age", "glucose"]);

    normalize(&mut encoded, &NormalizationSpec::all("minmax"), false).expect("normalize");
    assert_eq!(
        encoded.column("ehrcat_sex").expect("sex").to_vec(),
        vec![Value::number(1.0), Value::number(0.0), Value::number(0.0)]
    );
    assert_eq!(
        encoded.column("age").expect("age").to_vec(),
        vec![Value::number(0.0), Value::number(1.0 / 3.0), Value::number(1.0)]
    );
    assert_eq!(
        encoded.column("glucose").expect("glucose").to_vec(),
        vec![Value::number(0.0), Value::Missing, Value::number(1.0)]
    );
    assert_eq!(
        encoded.uns.normalization["age"],
        vec![NormalizationMethod::MinMax]
    );
    assert!(!encoded.uns.normalization.contains_key("ehrcat_sex"));
}

#[test]
fn per_variable_methods_are_recorded_in_order() {
    let mut encoded = encode(&patients(), true, None).expect("encode");
    let spec = NormalizationSpec::per_variable([
        ("robust_scale", vec!["age"]),
        ("quantile_uniform", vec!["age", "glucose"]),
    ]);
    let copy = normalize(&mut encoded, &spec, true)
        .expect("normalize")
        .expect("copy");
    assert_eq!(
        copy.uns.normalization["age"],
        vec![
            NormalizationMethod::RobustScale,
            NormalizationMethod::QuantileUniform
        ]
    );
    assert_eq!(
        copy.uns.normalization["glucose"],
        vec![NormalizationMethod::QuantileUniform]
    );
    assert_eq!(copy.layers[LAYER_RAW], encoded.x);
    assert!(encoded.uns.normalization.is_empty());
}
