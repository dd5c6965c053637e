//! CSV ingestion and archive round trips on disk.

use std::fs;

use ehr_encode::{EncodingSpec, encode};
use ehr_io::{IngestOptions, read_archive, read_csv, write_archive};
use ehr_model::{AnnotatedTable, EncodingMode, LAYER_ORIGINAL, Value};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const ADMISSIONS: &str = "\
patient_id,age,sex,ward,sodium,ventilated
p1,54,F,icu,140.5,1
p2,,M,cardio,,0
p3,71,F,icu,133.0,0
p4,38,,surgery,145.2,1
";

fn read_admissions(dir: &TempDir) -> AnnotatedTable {
    let path = dir.path().join("admissions.csv");
    fs::write(&path, ADMISSIONS).expect("write csv");
    let options = IngestOptions::new()
        .with_index_column("patient_id")
        .with_columns_obs_only(["ward"]);
    read_csv(&path, &options).expect("read csv")
}

fn column(table: &AnnotatedTable, name: &str) -> Vec<Value> {
    table.column(name).expect("column").to_vec()
}

#[test]
fn csv_is_split_and_classified() {
    init_tracing();
    let dir = TempDir::new().expect("temp dir");
    let table = read_admissions(&dir);

    assert_eq!(table.obs_names, vec!["p1", "p2", "p3", "p4"]);
    assert_eq!(table.var_names, vec!["age", "sex", "sodium", "ventilated"]);
    assert!(table.obs.column("ward").is_ok());
    assert_eq!(table.uns.numerical_columns, vec!["age", "sodium"]);
    assert_eq!(table.uns.non_numerical_columns, vec!["sex", "ventilated"]);
    assert_eq!(
        column(&table, "sex"),
        vec![Value::text("F"), Value::text("M"), Value::text("F"), Value::Missing]
    );
    assert!(table.x[[1, 0]].is_missing());
    assert!(table.layers.contains_key(LAYER_ORIGINAL));
}

#[test]
fn text_tables_are_encoded_on_write_and_decoded_on_read() {
    init_tracing();
    let dir = TempDir::new().expect("temp dir");
    let table = read_admissions(&dir);
    let path = dir.path().join("admissions.json");

    write_archive(&path, &table).expect("write archive");
    let raw = fs::read_to_string(&path).expect("read archive");
    assert!(raw.contains("\"encoded_on_write\":true"));

    let restored = read_archive(&path).expect("read archive");
    assert!(!restored.is_encoded());
    assert_eq!(restored.obs_names, table.obs_names);
    for name in &table.var_names {
        assert_eq!(column(&restored, name), column(&table, name), "column {name}");
    }
    let ward = restored.obs.column("ward").expect("ward");
    assert_eq!(ward.str().expect("str").get(3), Some("surgery"));
}

#[test]
fn encoded_tables_keep_their_history() {
    let dir = TempDir::new().expect("temp dir");
    let table = read_admissions(&dir);
    let spec = EncodingSpec::columns([(
        "one_hot_encoding",
        vec!["sex".into()],
    )]);
    let encoded = encode(&table, false, Some(&spec)).expect("encode");
    let path = dir.path().join("encoded.json");

    write_archive(&path, &encoded).expect("write archive");
    let restored = read_archive(&path).expect("read archive");

    assert!(restored.is_encoded());
    assert_eq!(restored.var_names, encoded.var_names);
    assert_eq!(restored.x, encoded.x);
    assert_eq!(restored.layers, encoded.layers);
    let history = restored.uns.encoding.as_ref().expect("history");
    assert_eq!(history.mode_of("sex"), Some(EncodingMode::OneHot));
    assert_eq!(restored.obs.height(), 4);
}

#[test]
fn unsupported_archive_version_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("numbers.json");
    let table = AnnotatedTable::from_columns([("age", vec![Value::number(1.0)])]).expect("table");
    write_archive(&path, &table).expect("write archive");

    let raw = fs::read_to_string(&path).expect("read");
    fs::write(&path, raw.replacen("\"version\":1", "\"version\":99", 1)).expect("rewrite");
    let err = read_archive(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported archive version 99"));
}

#[test]
fn missing_file_reports_the_path() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.csv");
    let err = read_csv(&path, &IngestOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
}
