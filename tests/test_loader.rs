use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use gex_charts::error::LoadError;
use gex_charts::load::{TimestampParser, load_series, load_snapshot};

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

// ── Time series ─────────────────────────────────────────────────────

#[test]
fn series_rows_with_wrong_width_or_bad_numbers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_gex_history.csv",
        "2024-01-02 09:30:00,1,4750\n\
         2024-01-02 09:31:00,1\n\
         2024-01-02 09:32:00,abc,4751\n\
         2024-01-02 09:33:00,,4752\n\
         2024-01-02 09:34:00,2,4753\n",
    );
    let table = load_series(&path, &columns(&["Time", "A", "SPOT"]), &TimestampParser::default()).unwrap();

    assert_eq!(table.columns, columns(&["A", "SPOT"]));
    assert_eq!(table.len(), 2);
    assert_eq!(table.rejected, 3);
    assert_eq!(table.column("SPOT"), Some(vec![4750.0, 4753.0]));
}

#[test]
fn series_row_with_invalid_utf8_is_rejected_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_gex_history.csv",
        b"2024-01-02 09:30:00,1,4750\n\
          2024-01-02 09:31:00,\xff\xfe,4751\n\
          2024-01-02 09:32:00,2,4752\n\
          \xff2024-01-02 09:33:00,3,4753\n",
    );
    let table = load_series(&path, &columns(&["Time", "A", "SPOT"]), &TimestampParser::default()).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.rejected, 2);
    assert_eq!(table.column("SPOT"), Some(vec![4750.0, 4752.0]));
}

#[test]
fn series_rows_are_sorted_and_last_duplicate_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_gex_history.csv",
        "2024-01-02 10:00:00,3\n\
         2024-01-02 09:00:00,1\n\
         2024-01-02 10:00:00,4\n",
    );
    let table = load_series(&path, &columns(&["Time", "A"]), &TimestampParser::default()).unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    assert_eq!(
        table.timestamps(),
        vec![
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(10, 0, 0).unwrap()
        ]
    );
    assert_eq!(table.column("A"), Some(vec![1.0, 4.0]));
}

#[test]
fn fallback_timestamp_formats_are_tried_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_gex_history.csv",
        "02/01/2024 09:30,1\n2024-01-02T09:31:00,2\n",
    );
    let table = load_series(&path, &columns(&["Time", "A"]), &TimestampParser::default()).unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    assert_eq!(table.rows[0].timestamp, day.and_hms_opt(9, 30, 0).unwrap());
    assert_eq!(table.rows[1].timestamp, day.and_hms_opt(9, 31, 0).unwrap());
}

#[test]
fn unparseable_timestamp_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_gex_history.csv",
        "2024-01-02 09:30:00,1\nnot a time,2\n",
    );
    let err = load_series(&path, &columns(&["Time", "A"]), &TimestampParser::default()).unwrap_err();

    match err {
        LoadError::Timestamp { line, value, .. } => {
            assert_eq!(line, 2);
            assert_eq!(value, "not a time");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_series(
        &dir.path().join("absent.csv"),
        &columns(&["Time", "A"]),
        &TimestampParser::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

// ── Snapshot ────────────────────────────────────────────────────────

#[test]
fn snapshot_reads_reference_prices_and_merges_strikes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_vol.csv",
        "4800,4815.25,479.5,,\n\
         4810,1,2,3\n\
         4790,10,0,0\n\
         4810,4,5,6\n\
         4795,x,1,1\n",
    );
    let table = load_snapshot(&path, &columns(&["Strike", "A", "B", "C"])).unwrap();

    assert_eq!(table.reference.as_slice(), &[4800.0, 4815.25, 479.5]);
    assert_eq!(table.reference.spot(), 4800.0);
    assert_eq!(table.volume_columns, columns(&["A", "B", "C"]));
    assert_eq!(table.rejected, 1);

    let strikes: Vec<f64> = table.rows.iter().map(|r| r.strike).collect();
    assert_eq!(strikes, vec![4790.0, 4810.0]);
    assert_eq!(table.rows[1].volumes, vec![5.0, 7.0, 9.0]);
    assert_eq!(table.rows[1].total(), 21.0);
}

#[test]
fn snapshot_row_with_invalid_utf8_is_rejected_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "spx_vol.csv",
        b"4800,4795,480\n4750,120,-30,10\n4760,\xff,1,1\n4770,1,1,1\n",
    );
    let table = load_snapshot(&path, &columns(&["Strike", "A", "B", "C"])).unwrap();

    assert_eq!(table.rejected, 1);
    let strikes: Vec<f64> = table.rows.iter().map(|r| r.strike).collect();
    assert_eq!(strikes, vec![4750.0, 4770.0]);
}

#[test]
fn snapshot_without_rows_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "spx_vol.csv", "");
    let err = load_snapshot(&path, &columns(&["Strike", "A"])).unwrap_err();
    assert!(matches!(err, LoadError::MissingReferencePrices { .. }));
}

#[test]
fn snapshot_with_text_reference_row_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "spx_vol.csv", "Strike,A\n4800,1\n");
    let err = load_snapshot(&path, &columns(&["Strike", "A"])).unwrap_err();
    match err {
        LoadError::BadReferencePrice { value, .. } => assert_eq!(value, "Strike"),
        other => panic!("unexpected error: {other}"),
    }
}
