use std::fs;

use gdelt_daily::bigquery::{QueryResponse, RowSet, decode_rows};
use gdelt_daily::domain::MaxRecords;
use gdelt_daily::fetch::map_rows;
use gdelt_daily::record::FieldValue;
use gdelt_daily::schema::GKG;

fn load_fixture() -> RowSet {
    let raw = fs::read_to_string("tests/fixtures/bigquery_gkg_response.json").unwrap();
    let response: QueryResponse = serde_json::from_str(&raw).unwrap();
    let schema = response.schema.unwrap();
    let columns = schema.fields.iter().map(|f| f.name.clone()).collect();
    let mut rows = RowSet::new(columns);
    rows.rows = decode_rows(&schema, response.rows).unwrap();
    rows
}

#[test]
fn gkg_response_maps_to_records() {
    let rows = load_fixture();
    assert_eq!(rows.len(), 2);

    let records = map_rows(&GKG, rows, MaxRecords::DEFAULT).unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(
        first.get("gkg_record_id"),
        Some(&FieldValue::Text("20250106001500-0".to_string()))
    );
    assert_eq!(
        first.get("date"),
        Some(&FieldValue::Text("20250106001500".to_string()))
    );
    assert_eq!(
        first.get("date_ts"),
        Some(&FieldValue::Text("2025-01-06 00:15:00+00:00".to_string()))
    );
    assert_eq!(
        first.get("source_collection_id"),
        Some(&FieldValue::Text("1".to_string()))
    );
    assert_eq!(
        first.get("v2_tone").and_then(|v| v.as_text()),
        Some("-2.1,1.3,3.4,4.7,22.1,0.5,310")
    );
    assert_eq!(first.get("gcam"), Some(&FieldValue::Null));
}

#[test]
fn gkg_truthy_ids_drop_zero_but_blobs_pass_through() {
    let records = map_rows(&GKG, load_fixture(), MaxRecords::DEFAULT).unwrap();
    let second = &records[1];
    assert_eq!(second.get("source_collection_id"), Some(&FieldValue::Null));
    assert_eq!(
        second.get("source_common_name"),
        Some(&FieldValue::Text(String::new()))
    );
}

#[test]
fn job_reference_is_decoded() {
    let raw = fs::read_to_string("tests/fixtures/bigquery_gkg_response.json").unwrap();
    let response: QueryResponse = serde_json::from_str(&raw).unwrap();
    let job = response.job_reference.unwrap();
    assert_eq!(job.job_id, "job_Xk2a9");
    assert_eq!(job.location.as_deref(), Some("US"));
    assert_eq!(response.job_complete, Some(true));
    assert!(response.page_token.is_none());
}
