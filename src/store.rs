use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::{Connection, params_from_iter};

use crate::domain::{DatasetKind, TargetDate};
use crate::error::GdeltError;
use crate::record::Record;
use crate::schema::{ConflictPolicy, DatasetSchema};

/// Layout of the per-day database files under one directory.
#[derive(Debug, Clone)]
pub struct Store {
    db_dir: Utf8PathBuf,
}

impl Store {
    pub fn new(db_dir: Utf8PathBuf) -> Self {
        Self { db_dir }
    }

    pub fn db_dir(&self) -> &Utf8Path {
        &self.db_dir
    }

    /// `<db_dir>/<dataset>_<YYYYMMDD>.db`
    pub fn db_path(&self, kind: DatasetKind, date: TargetDate) -> Utf8PathBuf {
        let file_name = format!("{}_{}.db", kind.as_str(), date.compact());
        self.db_dir.join(file_name)
    }

    pub fn ensure_db_dir(&self) -> Result<(), GdeltError> {
        fs::create_dir_all(self.db_dir.as_std_path())
            .map_err(|err| GdeltError::Filesystem(format!("create {}: {err}", self.db_dir)))
    }

    /// Opens (creating if needed) the day's database and ensures its schema.
    pub fn open_day(&self, kind: DatasetKind, date: TargetDate) -> Result<DayStore, GdeltError> {
        self.ensure_db_dir()?;
        DayStore::open(&self.db_path(kind, date), kind.schema())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// One open connection to a single day's database file.
pub struct DayStore {
    path: Utf8PathBuf,
    schema: &'static DatasetSchema,
    conn: Connection,
}

impl DayStore {
    pub fn open(path: &Utf8Path, schema: &'static DatasetSchema) -> Result<Self, GdeltError> {
        let conn = Connection::open(path.as_std_path())?;
        let store = Self {
            path: path.to_owned(),
            schema,
            conn,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn ensure_schema(&self) -> Result<(), GdeltError> {
        self.conn.execute_batch(&schema_sql(self.schema))?;
        tracing::debug!(table = self.schema.table, path = %self.path, "schema ensured");
        Ok(())
    }

    /// Writes every record in one transaction. Events rows whose
    /// `global_event_id` already exists are skipped; GKG rows always append.
    pub fn store(&mut self, records: &[Record]) -> Result<StoreSummary, GdeltError> {
        let sql = insert_sql(self.schema);
        let expected = self.schema.fields.len();
        let mut summary = StoreSummary::default();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                let values = record.values();
                if !std::ptr::eq(record.schema(), self.schema) || values.len() != expected {
                    return Err(GdeltError::RecordShape {
                        table: self.schema.table,
                        expected,
                        actual: values.len(),
                    });
                }
                match stmt.execute(params_from_iter(values.iter()))? {
                    0 => summary.skipped += 1,
                    _ => summary.inserted += 1,
                }
            }
        }
        tx.commit()?;

        tracing::info!(
            table = self.schema.table,
            inserted = summary.inserted,
            skipped = summary.skipped,
            "records stored"
        );
        Ok(summary)
    }

    pub fn row_count(&self) -> Result<u64, GdeltError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.schema.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    pub fn close(self) -> Result<(), GdeltError> {
        self.conn
            .close()
            .map_err(|(_, err)| GdeltError::Storage(err.to_string()))
    }
}

pub fn schema_sql(schema: &DatasetSchema) -> String {
    let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    columns.extend(schema.fields.iter().map(|field| {
        let unique = if schema.unique_column == Some(field.column) {
            " UNIQUE"
        } else {
            ""
        };
        format!("{} {}{unique}", field.column, field.column_type.sql())
    }));

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);\n",
        schema.table,
        columns.join(",\n    ")
    );
    for index in schema.indexes {
        sql.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({});\n",
            index.name, schema.table, index.column
        ));
    }
    sql
}

pub fn insert_sql(schema: &DatasetSchema) -> String {
    let verb = match schema.conflict {
        ConflictPolicy::IgnoreDuplicates => "INSERT OR IGNORE",
        ConflictPolicy::Append => "INSERT",
    };
    let columns = schema
        .fields
        .iter()
        .map(|field| field.column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=schema.fields.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{verb} INTO {} ({columns}) VALUES ({placeholders})",
        schema.table
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EVENTS, GKG};

    #[test]
    fn layout_paths() {
        let store = Store::new(Utf8PathBuf::from("db"));
        let date: TargetDate = "2025-01-06".parse().unwrap();
        assert_eq!(
            store.db_path(DatasetKind::Events, date),
            Utf8PathBuf::from("db/events_20250106.db")
        );
        assert_eq!(
            store.db_path(DatasetKind::Gkg, date),
            Utf8PathBuf::from("db/gkg_20250106.db")
        );
    }

    #[test]
    fn insert_verbs_follow_conflict_policy() {
        assert!(insert_sql(&EVENTS).starts_with("INSERT OR IGNORE INTO events ("));
        assert!(insert_sql(&GKG).starts_with("INSERT INTO gkg ("));
        assert!(insert_sql(&EVENTS).ends_with("?61)"));
    }

    #[test]
    fn unique_constraint_only_on_events() {
        assert!(schema_sql(&EVENTS).contains("global_event_id TEXT UNIQUE"));
        assert!(!schema_sql(&GKG).contains("UNIQUE"));
    }
}
