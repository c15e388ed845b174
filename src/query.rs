use crate::domain::{MaxRecords, TargetDate};
use crate::error::GdeltError;
use crate::schema::{DatasetSchema, DateFilter};

/// Half-open day window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: TargetDate,
    pub end: TargetDate,
}

impl DateRange {
    pub fn for_day(date: TargetDate) -> Result<Self, GdeltError> {
        Ok(Self {
            start: date,
            end: date.next_day()?,
        })
    }
}

/// A fully rendered, bounded warehouse query. Nothing is executed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseQuery {
    pub sql: String,
    pub max_records: u64,
}

pub struct QueryBuilder {
    schema: &'static DatasetSchema,
}

impl QueryBuilder {
    pub fn new(schema: &'static DatasetSchema) -> Self {
        Self { schema }
    }

    pub fn build(
        &self,
        date: TargetDate,
        max_records: MaxRecords,
    ) -> Result<WarehouseQuery, GdeltError> {
        let range = DateRange::for_day(date)?;
        let projection = self
            .schema
            .fields
            .iter()
            .map(|field| match field.expression {
                Some(expression) => format!("    {expression} AS {}", field.source),
                None => format!("    {}", field.source),
            })
            .collect::<Vec<_>>()
            .join(",\n");

        let sql = format!(
            "SELECT\n{projection}\nFROM `{table}`\nWHERE\n    {filter}\n    AND {guard} IS NOT NULL\nLIMIT {limit}",
            table = self.schema.remote_table,
            filter = date_filter_sql(self.schema.date_filter, &range),
            guard = self.schema.required_source,
            limit = max_records.get(),
        );

        Ok(WarehouseQuery {
            sql,
            max_records: max_records.get(),
        })
    }
}

fn date_filter_sql(filter: DateFilter, range: &DateRange) -> String {
    match filter {
        DateFilter::CompactInteger(column) => format!(
            "{column} >= {} AND {column} < {}",
            range.start.compact_number(),
            range.end.compact_number()
        ),
        DateFilter::PartitionTimestamp(column) => format!(
            "{column} >= TIMESTAMP('{}') AND {column} < TIMESTAMP('{}')",
            range.start, range.end
        ),
    }
}
