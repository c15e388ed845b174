use std::time::{Duration, Instant};

use chrono::DateTime;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::GdeltError;
use crate::query::WarehouseQuery;
use crate::record::Cell;

const PAGE_SIZE: u64 = 10_000;
const POLL_TIMEOUT_MS: u64 = 10_000;

/// Rows of one query result, with column names in result order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub trait WarehouseClient: Send + Sync {
    fn run_query(&self, query: &WarehouseQuery) -> Result<RowSet, GdeltError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub job_complete: Option<bool>,
}

impl QueryResponse {
    fn is_complete(&self) -> bool {
        self.job_complete.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: Value,
}

#[derive(Clone)]
pub struct BigQueryHttpClient {
    client: Client,
    endpoint: String,
    project_id: String,
    access_token: String,
    timeout: Duration,
}

impl BigQueryHttpClient {
    pub fn new(
        endpoint: &str,
        project_id: &str,
        access_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GdeltError> {
        let access_token = access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(GdeltError::MissingCredentials)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gdelt-daily/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GdeltError::WarehouseHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| GdeltError::WarehouseHttp(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            access_token: access_token.trim().to_string(),
            timeout,
        })
    }

    fn queries_url(&self) -> String {
        format!("{}/projects/{}/queries", self.endpoint, self.project_id)
    }

    fn results_url(&self, job: &JobReference) -> String {
        format!(
            "{}/projects/{}/queries/{}",
            self.endpoint, job.project_id, job.job_id
        )
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, GdeltError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .unwrap_or_else(|_| "BigQuery request failed".to_string());
        Err(GdeltError::WarehouseStatus {
            status,
            message: extract_error_message(&body).unwrap_or(body),
        })
    }

    fn submit(&self, query: &WarehouseQuery) -> Result<QueryResponse, GdeltError> {
        let body = json!({
            "query": query.sql,
            "useLegacySql": false,
            "maxResults": query.max_records.min(PAGE_SIZE),
            "timeoutMs": POLL_TIMEOUT_MS,
            "formatOptions": { "useInt64Timestamp": true },
        });
        let response = self
            .client
            .post(self.queries_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(|err| GdeltError::WarehouseHttp(err.to_string()))?;
        Self::handle_status(response)?
            .json()
            .map_err(|err| GdeltError::WarehouseResponse(err.to_string()))
    }

    fn get_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
        page_size: u64,
    ) -> Result<QueryResponse, GdeltError> {
        let mut params = vec![
            ("maxResults", page_size.to_string()),
            ("timeoutMs", POLL_TIMEOUT_MS.to_string()),
            ("formatOptions.useInt64Timestamp", "true".to_string()),
        ];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let response = self
            .client
            .get(self.results_url(job))
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .map_err(|err| GdeltError::WarehouseHttp(err.to_string()))?;
        Self::handle_status(response)?
            .json()
            .map_err(|err| GdeltError::WarehouseResponse(err.to_string()))
    }
}

impl WarehouseClient for BigQueryHttpClient {
    fn run_query(&self, query: &WarehouseQuery) -> Result<RowSet, GdeltError> {
        let started = Instant::now();
        let mut response = self.submit(query)?;
        let job = response
            .job_reference
            .clone()
            .ok_or_else(|| GdeltError::WarehouseResponse("missing jobReference".to_string()))?;
        tracing::debug!(job_id = %job.job_id, "query submitted");

        let page_size = query.max_records.min(PAGE_SIZE);
        while !response.is_complete() {
            if started.elapsed() > self.timeout {
                return Err(GdeltError::WarehouseHttp(format!(
                    "job {} did not complete within {}s",
                    job.job_id,
                    self.timeout.as_secs()
                )));
            }
            tracing::debug!(job_id = %job.job_id, "waiting for query job");
            response = self.get_results(&job, None, page_size)?;
        }

        let schema = response
            .schema
            .clone()
            .ok_or_else(|| GdeltError::WarehouseResponse("missing result schema".to_string()))?;
        let mut result = RowSet::new(schema.fields.iter().map(|f| f.name.clone()).collect());
        let limit = usize::try_from(query.max_records).unwrap_or(usize::MAX);

        loop {
            let page_token = response.page_token.take();
            result
                .rows
                .extend(decode_rows(&schema, std::mem::take(&mut response.rows))?);
            tracing::debug!(rows = result.len(), "result page received");
            match page_token {
                Some(token) if result.len() < limit => {
                    response = self.get_results(&job, Some(&token), page_size)?;
                }
                _ => break,
            }
        }

        result.rows.truncate(limit);
        Ok(result)
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map(|message| message.to_string())
}

pub fn decode_rows(
    schema: &TableSchema,
    rows: Vec<TableRow>,
) -> Result<Vec<Vec<Cell>>, GdeltError> {
    rows.into_iter()
        .map(|row| {
            if row.f.len() != schema.fields.len() {
                return Err(GdeltError::WarehouseResponse(format!(
                    "row has {} cells, schema has {} fields",
                    row.f.len(),
                    schema.fields.len()
                )));
            }
            schema
                .fields
                .iter()
                .zip(row.f)
                .map(|(field, cell)| decode_cell(field, cell.v))
                .collect()
        })
        .collect()
}

pub fn decode_cell(field: &TableField, value: Value) -> Result<Cell, GdeltError> {
    let raw = match value {
        Value::Null => return Ok(Cell::Null),
        Value::String(raw) => raw,
        Value::Bool(flag) => return Ok(Cell::Boolean(flag)),
        other => other.to_string(),
    };
    let invalid = || {
        GdeltError::WarehouseResponse(format!(
            "field {} ({}) has invalid value {raw:?}",
            field.name, field.field_type
        ))
    };

    match field.field_type.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => raw.parse().map(Cell::Integer).map_err(|_| invalid()),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => {
            raw.parse().map(Cell::Float).map_err(|_| invalid())
        }
        "BOOLEAN" | "BOOL" => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(Cell::Boolean(true)),
            "false" => Ok(Cell::Boolean(false)),
            _ => Err(invalid()),
        },
        "TIMESTAMP" => match parse_timestamp(&raw) {
            Some(value) => Ok(Cell::Timestamp(value)),
            None => Err(invalid()),
        },
        _ => Ok(Cell::Text(raw)),
    }
}

/// Accepts epoch microseconds (`useInt64Timestamp`) or float epoch seconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<chrono::Utc>> {
    if let Ok(micros) = raw.parse::<i64>() {
        return DateTime::from_timestamp_micros(micros);
    }
    let seconds: f64 = raw.parse().ok()?;
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
}
