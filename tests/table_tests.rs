// tests/table_tests.rs
use dbsheets::table_utils::{CellValue, TableBuilder, TableConverter};

fn sample_snapshot() -> TableBuilder {
    TableBuilder::from_raw_data(
        vec!["id".to_string(), "name".to_string()],
        vec![
            vec![CellValue::Integer(1), CellValue::from("Alice")],
            vec![CellValue::Integer(2), CellValue::from("Bob")],
            vec![CellValue::Integer(3), CellValue::from("Cara")],
        ],
    )
}

#[test]
fn new_builder_is_empty() {
    let builder = TableBuilder::new();

    assert!(!builder.has_data());
    assert!(builder.get_headers().is_none());
    assert!(builder.get_data().is_none());
    assert!(builder.get_error().is_none());
}

#[test]
fn raw_data_round_trips_through_getters() {
    let builder = sample_snapshot();

    assert_eq!(builder.get_headers().unwrap(), &["id", "name"]);
    let data = builder.get_data().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0][1], CellValue::Text("Alice".to_string()));
}

#[test]
fn chained_construction_matches_raw_data() {
    let mut builder = TableBuilder::new();
    builder
        .set_header(vec!["id", "name"])
        .add_row(vec![CellValue::Integer(1), CellValue::from("Alice")])
        .add_rows(vec![
            vec![CellValue::Integer(2), CellValue::from("Bob")],
            vec![CellValue::Integer(3), CellValue::from("Cara")],
        ]);

    let reference = sample_snapshot();
    assert_eq!(builder.get_headers(), reference.get_headers());
    assert_eq!(builder.get_data(), reference.get_data());
}

#[test]
fn order_columns_moves_named_columns_to_front_and_back() {
    let mut builder = TableBuilder::from_raw_data(
        vec!["b".to_string(), "id".to_string(), "a".to_string()],
        vec![vec![
            CellValue::from("x"),
            CellValue::Integer(7),
            CellValue::from("y"),
        ]],
    );

    builder.order_columns(vec!["id", "...", "b"]);

    assert_eq!(builder.get_headers().unwrap(), &["id", "a", "b"]);
    assert_eq!(
        builder.get_data().unwrap()[0],
        vec![
            CellValue::Integer(7),
            CellValue::from("y"),
            CellValue::from("x"),
        ]
    );
}

#[test]
fn retain_columns_keeps_only_named_columns_in_order() {
    let mut builder = sample_snapshot();
    builder.retain_columns(vec!["name"]);

    assert_eq!(builder.get_headers().unwrap(), &["name"]);
    assert_eq!(
        builder.get_data().unwrap()[2],
        vec![CellValue::from("Cara")]
    );
}

#[test]
fn drop_columns_removes_named_columns() {
    let mut builder = sample_snapshot();
    builder.drop_columns(vec!["id"]);

    assert_eq!(builder.get_headers().unwrap(), &["name"]);
    assert_eq!(builder.get_data().unwrap().len(), 3);
}

#[test]
fn limit_truncates_data() {
    let mut builder = sample_snapshot();
    builder.limit(2);

    assert_eq!(builder.get_data().unwrap().len(), 2);
}

#[test]
fn header_whitespace_normalization() {
    let mut builder = TableBuilder::new();
    builder
        .set_header(vec!["student id", "first name"])
        .replace_header_whitespaces_with_underscores();

    assert_eq!(builder.get_headers().unwrap(), &["student_id", "first_name"]);
}

#[test]
fn from_csv_missing_file_sets_error_slot() {
    let builder = TableBuilder::from_csv("definitely_not_here.csv");

    assert!(builder.get_headers().is_none());
    assert!(builder.get_data().is_none());
    assert!(builder.get_error().is_some());
}

#[test]
fn save_as_then_from_csv_preserves_shape_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.csv");
    let path = path.to_str().unwrap();

    let mut builder = sample_snapshot();
    builder.save_as(path).unwrap();

    let reread = TableBuilder::from_csv(path);
    assert_eq!(reread.get_headers().unwrap(), &["id", "name"]);

    let data = reread.get_data().unwrap();
    assert_eq!(data.len(), 3);
    // CSV erases types; everything comes back as text
    assert_eq!(data[0][0], CellValue::Text("1".to_string()));
    assert_eq!(data[2][1], CellValue::Text("Cara".to_string()));
}

#[test]
fn save_as_pads_short_rows_to_header_width() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("padded.csv");
    let path = path.to_str().unwrap();

    let mut builder = TableBuilder::from_raw_data(
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        vec![vec![CellValue::from("only")]],
    );
    builder.save_as(path).unwrap();

    let reread = TableBuilder::from_csv(path);
    assert_eq!(reread.get_data().unwrap()[0].len(), 3);
}

#[test]
fn from_copy_drops_the_error() {
    let broken = TableBuilder::from_csv("definitely_not_here.csv");
    assert!(broken.get_error().is_some());

    let copy = broken.from_copy();
    assert!(copy.get_error().is_none());
}

#[test]
fn cell_display_is_the_naive_stringification() {
    assert_eq!(CellValue::Text("Alice".to_string()).to_string(), "Alice");
    assert_eq!(CellValue::Integer(-3).to_string(), "-3");
    assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
    assert_eq!(CellValue::Null.to_string(), "");
}

#[test]
fn cell_to_json_keeps_numbers_and_blanks_nulls() {
    assert_eq!(
        CellValue::Integer(42).to_json(),
        serde_json::Value::from(42_i64)
    );
    assert_eq!(
        CellValue::Float(2.5).to_json(),
        serde_json::Value::from(2.5_f64)
    );
    assert_eq!(
        CellValue::Null.to_json(),
        serde_json::Value::String(String::new())
    );
    // JSON cannot carry non-finite numbers; they travel as text
    assert_eq!(
        CellValue::Float(f64::NAN).to_json(),
        serde_json::Value::String("NaN".to_string())
    );
}

#[test]
fn converter_builds_typed_rows_from_json_objects() {
    let json_data = r#"[
        {"name": "Alice", "age": 30, "gpa": 3.5, "note": null},
        {"name": "Bob", "age": 25, "gpa": 3.9, "note": "transfer"}
    ]"#;

    let builder = TableConverter::from_json(json_data).unwrap();
    let headers = builder.get_headers().unwrap();
    let data = builder.get_data().unwrap();

    assert_eq!(headers.len(), 4);
    assert_eq!(data.len(), 2);

    let age_idx = headers.iter().position(|h| h == "age").unwrap();
    let gpa_idx = headers.iter().position(|h| h == "gpa").unwrap();
    let note_idx = headers.iter().position(|h| h == "note").unwrap();
    assert_eq!(data[0][age_idx], CellValue::Integer(30));
    assert_eq!(data[0][gpa_idx], CellValue::Float(3.5));
    assert_eq!(data[0][note_idx], CellValue::Null);
}

#[test]
fn converter_rejects_non_array_json() {
    assert!(TableConverter::from_json(r#"{"name": "Alice"}"#).is_err());
}
