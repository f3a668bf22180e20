// tests/sheet_tests.rs
use dbsheets::errors::SheetError;
use dbsheets::sheet_utils::{
    column_label, data_range, quote_worksheet, PublishMode, SheetConnectConfig,
};
use std::io::Write;

#[test]
fn column_labels_roll_over_like_spreadsheets() {
    assert_eq!(column_label(1), "A");
    assert_eq!(column_label(2), "B");
    assert_eq!(column_label(26), "Z");
    assert_eq!(column_label(27), "AA");
    assert_eq!(column_label(52), "AZ");
    assert_eq!(column_label(53), "BA");
    assert_eq!(column_label(702), "ZZ");
    assert_eq!(column_label(703), "AAA");
}

#[test]
fn a_three_row_two_column_snapshot_covers_a1_to_b4() {
    // Header plus three data rows
    assert_eq!(data_range("Sheet1", 4, 2), "Sheet1!A1:B4");
}

#[test]
fn worksheet_titles_with_spaces_are_quoted() {
    assert_eq!(
        data_range("Current Enrollment", 4, 2),
        "'Current Enrollment'!A1:B4"
    );
}

#[test]
fn quoting_doubles_embedded_apostrophes() {
    assert_eq!(quote_worksheet("Sheet1"), "Sheet1");
    assert_eq!(quote_worksheet("Q1 '24"), "'Q1 ''24'");
}

#[test]
fn config_from_url_extracts_the_workbook_id() {
    let config = SheetConnectConfig::from_url(
        "https://docs.google.com/spreadsheets/d/1LcB3bqPJ-CPUNPeR-Ohdd5bI6jjV6enh5Gd338Dqqcs/edit#gid=0",
        "Current Enrollment",
    )
    .unwrap();

    assert_eq!(
        config.spreadsheet_id,
        "1LcB3bqPJ-CPUNPeR-Ohdd5bI6jjV6enh5Gd338Dqqcs"
    );
    assert_eq!(config.worksheet, "Current Enrollment");
    assert_eq!(config.mode, PublishMode::Replace);
}

#[test]
fn config_from_url_rejects_urls_without_a_workbook_segment() {
    let err = SheetConnectConfig::from_url("https://docs.google.com/spreadsheets/u/0/", "Sheet1")
        .unwrap_err();

    assert!(matches!(err, SheetError::InvalidReference { .. }), "got {:?}", err);
}

#[test]
fn config_from_file_defaults_to_replace_mode() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(
        br#"{"spreadsheet_id": "wb-id", "worksheet": "Current Enrollment"}"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = SheetConnectConfig::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.spreadsheet_id, "wb-id");
    assert_eq!(config.mode, PublishMode::Replace);
}

#[test]
fn config_from_file_parses_append_mode() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(
        br#"{"spreadsheet_id": "wb-id", "worksheet": "Sheet1", "mode": "APPEND"}"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = SheetConnectConfig::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.mode, PublishMode::Append);
}

#[test]
fn config_from_file_missing_file_errors() {
    assert!(SheetConnectConfig::from_file("/no/such/config.json").is_err());
}
