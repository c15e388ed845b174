use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::Connection;
use rusqlite::types::Value;

use gdelt_daily::bigquery::RowSet;
use gdelt_daily::domain::{DatasetKind, MaxRecords, TargetDate};
use gdelt_daily::error::GdeltError;
use gdelt_daily::fetch::map_rows;
use gdelt_daily::record::{Cell, Record};
use gdelt_daily::schema::EVENTS;
use gdelt_daily::store::Store;

fn event_record(values: &[(&str, Cell)]) -> Record {
    let columns = EVENTS.fields.iter().map(|f| f.source.to_string());
    let mut rows = RowSet::new(columns.collect());
    rows.rows.push(
        EVENTS
            .fields
            .iter()
            .map(|field| {
                values
                    .iter()
                    .find(|(name, _)| *name == field.source)
                    .map(|(_, cell)| cell.clone())
                    .unwrap_or(Cell::Null)
            })
            .collect(),
    );
    map_rows(&EVENTS, rows, MaxRecords::DEFAULT)
        .unwrap()
        .remove(0)
}

fn stored_value(path: &Utf8Path, column: &str) -> Value {
    let conn = Connection::open(path.as_std_path()).unwrap();
    let sql = format!("SELECT {column} FROM events");
    conn.query_row(&sql, [], |row| row.get(0)).unwrap()
}

fn setup() -> (tempfile::TempDir, Store, TargetDate) {
    let temp = tempfile::tempdir().unwrap();
    let db_dir = temp.path().join("nested/db");
    let store = Store::new(Utf8PathBuf::from_path_buf(db_dir).unwrap());
    (temp, store, "2025-01-06".parse().unwrap())
}

#[test]
fn open_creates_directory_and_file() {
    let (_temp, store, date) = setup();
    let day = store.open_day(DatasetKind::Gkg, date).unwrap();
    assert!(day.path().as_std_path().exists());
    assert!(day.path().ends_with("gkg_20250106.db"));
}

#[test]
fn ensure_schema_twice_keeps_data() {
    let (_temp, store, date) = setup();
    let mut day = store.open_day(DatasetKind::Events, date).unwrap();
    let record = event_record(&[("GLOBALEVENTID", Cell::Integer(42))]);
    day.store(&[record]).unwrap();

    day.ensure_schema().unwrap();
    day.ensure_schema().unwrap();
    assert_eq!(day.row_count().unwrap(), 1);
    day.close().unwrap();

    let reopened = store.open_day(DatasetKind::Events, date).unwrap();
    assert_eq!(reopened.row_count().unwrap(), 1);
}

#[test]
fn zero_values_follow_field_policy() {
    let (_temp, store, date) = setup();
    let mut day = store.open_day(DatasetKind::Events, date).unwrap();
    let record = event_record(&[
        ("GLOBALEVENTID", Cell::Integer(7)),
        ("SQLDATE", Cell::Integer(20250106)),
        ("Year", Cell::Integer(0)),
        ("FractionDate", Cell::Float(0.0)),
        ("QuadClass", Cell::Integer(0)),
        ("NumMentions", Cell::Integer(0)),
        ("AvgTone", Cell::Float(0.0)),
    ]);
    let summary = day.store(&[record]).unwrap();
    assert_eq!(summary.inserted, 1);
    let path = day.path().to_owned();
    day.close().unwrap();

    assert_eq!(stored_value(&path, "year"), Value::Null);
    assert_eq!(stored_value(&path, "fraction_date"), Value::Null);
    assert_eq!(stored_value(&path, "quad_class"), Value::Integer(0));
    assert_eq!(stored_value(&path, "num_mentions"), Value::Integer(0));
    assert_eq!(stored_value(&path, "avg_tone"), Value::Real(0.0));
    assert_eq!(stored_value(&path, "sql_date"), Value::Integer(20250106));
}

#[test]
fn duplicate_event_ids_are_skipped_not_overwritten() {
    let (_temp, store, date) = setup();
    let mut day = store.open_day(DatasetKind::Events, date).unwrap();
    let original = event_record(&[
        ("GLOBALEVENTID", Cell::Integer(99)),
        ("Actor1Name", Cell::Text("FRANCE".to_string())),
    ]);
    let duplicate = event_record(&[
        ("GLOBALEVENTID", Cell::Integer(99)),
        ("Actor1Name", Cell::Text("GERMANY".to_string())),
    ]);
    let summary = day.store(&[original, duplicate]).unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 1);
    let path = day.path().to_owned();
    day.close().unwrap();

    let name = stored_value(&path, "actor1_name");
    assert_eq!(name, Value::Text("FRANCE".to_string()));
}

#[test]
fn mismatched_record_is_rejected() {
    let (_temp, store, date) = setup();
    let mut day = store.open_day(DatasetKind::Events, date).unwrap();
    let malformed = Record::new(&EVENTS, Vec::new());
    let err = day.store(&[malformed]).unwrap_err();
    assert_matches!(
        err,
        GdeltError::RecordShape {
            expected: 61,
            actual: 0,
            ..
        }
    );
    assert_eq!(day.row_count().unwrap(), 0);
}

#[test]
fn indexes_exist_after_open() {
    let (_temp, store, date) = setup();
    let day = store.open_day(DatasetKind::Events, date).unwrap();
    let path = day.path().to_owned();
    day.close().unwrap();

    let conn = Connection::open(path.as_std_path()).unwrap();
    let sql = "SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'";
    let mut stmt = conn.prepare(sql).unwrap();
    let mut names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    names.sort();
    assert_eq!(
        names,
        vec![
            "idx_events_actor1",
            "idx_events_actor2",
            "idx_events_date",
            "idx_events_event_code",
            "idx_events_global_id",
            "idx_events_goldstein",
        ]
    );
}
