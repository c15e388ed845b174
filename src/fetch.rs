use crate::bigquery::{RowSet, WarehouseClient};
use crate::domain::{MaxRecords, TargetDate};
use crate::error::GdeltError;
use crate::query::QueryBuilder;
use crate::record::{Cell, FieldValue, Record};
use crate::schema::{Coercion, DatasetSchema, FieldSpec};

/// Runs one dataset query and maps each returned row through the field table.
pub struct Fetcher<'a, W: WarehouseClient> {
    client: &'a W,
    schema: &'static DatasetSchema,
}

impl<'a, W: WarehouseClient> Fetcher<'a, W> {
    pub fn new(client: &'a W, schema: &'static DatasetSchema) -> Self {
        Self { client, schema }
    }

    pub fn fetch(
        &self,
        date: TargetDate,
        max_records: MaxRecords,
    ) -> Result<Vec<Record>, GdeltError> {
        let query = QueryBuilder::new(self.schema).build(date, max_records)?;
        tracing::info!(
            dataset = %self.schema.kind,
            %date,
            max = %max_records,
            "running warehouse query"
        );
        let rows = self.client.run_query(&query)?;
        let records = map_rows(self.schema, rows, max_records)?;
        tracing::info!(dataset = %self.schema.kind, records = records.len(), "rows mapped");
        Ok(records)
    }
}

/// Maps warehouse rows to records by source field name, keeping row order.
pub fn map_rows(
    schema: &'static DatasetSchema,
    rows: RowSet,
    max_records: MaxRecords,
) -> Result<Vec<Record>, GdeltError> {
    let positions = schema
        .fields
        .iter()
        .map(|field| {
            rows.column_index(field.source)
                .ok_or(GdeltError::MissingColumn {
                    dataset: schema.kind.as_str(),
                    column: field.source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    rows.rows
        .iter()
        .take(max_records.as_usize())
        .map(|row| {
            let values = schema
                .fields
                .iter()
                .zip(&positions)
                .map(|(field, &idx)| coerce(field, row.get(idx).unwrap_or(&Cell::Null)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Record::new(schema, values))
        })
        .collect()
}

pub fn coerce(field: &FieldSpec, cell: &Cell) -> Result<FieldValue, GdeltError> {
    let present = match field.coercion {
        Coercion::IntegerIfTruthy | Coercion::FloatIfTruthy | Coercion::TextIfTruthy => {
            cell.is_truthy()
        }
        _ => !cell.is_null(),
    };
    if !present {
        return Ok(FieldValue::Null);
    }

    match field.coercion {
        Coercion::Passthrough => Ok(passthrough(cell)),
        Coercion::Integer | Coercion::IntegerIfTruthy => to_integer(field, cell),
        Coercion::Float | Coercion::FloatIfTruthy => to_float(field, cell),
        Coercion::Text | Coercion::TextIfTruthy => Ok(render_text(cell)),
    }
}

fn passthrough(cell: &Cell) -> FieldValue {
    match cell {
        Cell::Null => FieldValue::Null,
        Cell::Integer(value) => FieldValue::Integer(*value),
        Cell::Float(value) => FieldValue::Real(*value),
        Cell::Text(value) => FieldValue::Text(value.clone()),
        Cell::Boolean(value) => FieldValue::Integer(i64::from(*value)),
        Cell::Timestamp(_) => render_text(cell),
    }
}

fn render_text(cell: &Cell) -> FieldValue {
    match cell.render() {
        Some(text) => FieldValue::Text(text),
        None => FieldValue::Null,
    }
}

fn to_integer(field: &FieldSpec, cell: &Cell) -> Result<FieldValue, GdeltError> {
    match cell {
        Cell::Integer(value) => Ok(FieldValue::Integer(*value)),
        Cell::Float(value) if value.is_finite() => Ok(FieldValue::Integer(value.trunc() as i64)),
        Cell::Boolean(value) => Ok(FieldValue::Integer(i64::from(*value))),
        Cell::Text(value) => value
            .trim()
            .parse()
            .map(FieldValue::Integer)
            .map_err(|_| coercion_error(field, cell)),
        _ => Err(coercion_error(field, cell)),
    }
}

fn to_float(field: &FieldSpec, cell: &Cell) -> Result<FieldValue, GdeltError> {
    match cell {
        Cell::Integer(value) => Ok(FieldValue::Real(*value as f64)),
        Cell::Float(value) => Ok(FieldValue::Real(*value)),
        Cell::Boolean(value) => Ok(FieldValue::Real(if *value { 1.0 } else { 0.0 })),
        Cell::Text(value) => value
            .trim()
            .parse()
            .map(FieldValue::Real)
            .map_err(|_| coercion_error(field, cell)),
        _ => Err(coercion_error(field, cell)),
    }
}

fn coercion_error(field: &FieldSpec, cell: &Cell) -> GdeltError {
    GdeltError::Coercion {
        field: field.column,
        value: cell.render().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EVENTS;

    #[test]
    fn truthy_policy_drops_zero() {
        let year = EVENTS.field("year").unwrap();
        assert_eq!(coerce(year, &Cell::Integer(0)).unwrap(), FieldValue::Null);
        assert_eq!(
            coerce(year, &Cell::Integer(2025)).unwrap(),
            FieldValue::Integer(2025)
        );
    }

    #[test]
    fn not_null_policy_keeps_zero() {
        let quad = EVENTS.field("quad_class").unwrap();
        assert_eq!(
            coerce(quad, &Cell::Integer(0)).unwrap(),
            FieldValue::Integer(0)
        );
        assert_eq!(coerce(quad, &Cell::Null).unwrap(), FieldValue::Null);
    }

    #[test]
    fn identifiers_become_text() {
        let id = EVENTS.field("global_event_id").unwrap();
        assert_eq!(
            coerce(id, &Cell::Integer(1217486632)).unwrap(),
            FieldValue::Text("1217486632".to_string())
        );
        let feature = EVENTS.field("action_geo_feature_id").unwrap();
        assert_eq!(
            coerce(feature, &Cell::Integer(0)).unwrap(),
            FieldValue::Text("0".to_string())
        );
    }

    #[test]
    fn unparsable_integer_is_an_error() {
        let quad = EVENTS.field("quad_class").unwrap();
        assert!(coerce(quad, &Cell::Text("four".to_string())).is_err());
    }
}
