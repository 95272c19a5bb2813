//! Conversion from JSON documents to payloads and schemas.
//!
//! Row data arrives either row-oriented (`[{"x": 1, "y": "a"}, ...]`) or
//! column-oriented (`{"x": [1, 2], "y": ["a", "b"]}`). Cells convert without
//! a schema; the column type is applied when the cell is written.

use crate::config::TableOptions;
use log::debug;
use pivotal_core::schema::{SchemaBuilder, TableSchema};
use pivotal_core::{DataType, Error, Payload, Result, RowIndex, Value, INDEX_FIELD};
use serde_json::{Map, Value as Json};

/// Non-null values per field examined by schema inference.
pub const INFERENCE_SAMPLE: usize = 100;

/// Converts one JSON cell.
///
/// Integers become `Int64`, other numbers `Float64`. Arrays and objects are
/// rejected.
pub fn json_to_value(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int64(i)),
            None => n
                .as_f64()
                .map(Value::Float64)
                .ok_or_else(|| Error::invalid_operation(format!("Number out of range: {}", n))),
        },
        Json::String(s) => Ok(Value::String(s.clone())),
        other => Err(Error::invalid_operation(format!(
            "Unsupported cell value: {}",
            other
        ))),
    }
}

fn json_to_index(json: &Json) -> Result<Option<RowIndex>> {
    match json {
        Json::Null => Ok(None),
        Json::Number(n) => n
            .as_u64()
            .and_then(|i| RowIndex::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| Error::invalid_operation(format!("Invalid {}: {}", INDEX_FIELD, n))),
        other => Err(Error::invalid_operation(format!(
            "Invalid {}: {}",
            INDEX_FIELD, other
        ))),
    }
}

fn set_field(payload: &mut Payload, name: &str, json: &Json) -> Result<()> {
    if name == INDEX_FIELD {
        payload.set_index(json_to_index(json)?);
    } else {
        payload.set(name, json_to_value(json)?);
    }
    Ok(())
}

/// Converts one JSON object into a payload. `__INDEX__` becomes the
/// positional marker.
pub fn object_to_payload(object: &Map<String, Json>) -> Result<Payload> {
    let mut payload = Payload::new();
    for (name, json) in object {
        set_field(&mut payload, name, json)?;
    }
    Ok(payload)
}

/// Converts a row- or column-oriented JSON document into payloads.
pub fn json_to_payloads(data: &Json) -> Result<Vec<Payload>> {
    match data {
        Json::Array(rows) => rows
            .iter()
            .map(|row| match row {
                Json::Object(object) => object_to_payload(object),
                other => Err(Error::invalid_operation(format!(
                    "Expected an object per row, got {}",
                    other
                ))),
            })
            .collect(),
        Json::Object(columns) => {
            let mut payloads: Vec<Payload> = Vec::new();
            for (name, cells) in columns {
                let cells = cells.as_array().ok_or_else(|| {
                    Error::invalid_operation(format!("Column {} is not an array", name))
                })?;
                if payloads.len() < cells.len() {
                    payloads.resize_with(cells.len(), Payload::new);
                }
                for (payload, json) in payloads.iter_mut().zip(cells) {
                    set_field(payload, name, json)?;
                }
            }
            Ok(payloads)
        }
        other => Err(Error::invalid_operation(format!(
            "Expected an array of rows or an object of columns, got {}",
            other
        ))),
    }
}

/// Reads an explicit schema, `{"name": "integer", ...}`.
pub fn json_to_schema(name: &str, data: &Json, options: &TableOptions) -> Result<TableSchema> {
    let columns = data
        .as_object()
        .ok_or_else(|| Error::invalid_schema("Expected an object of column types"))?;
    let mut builder = SchemaBuilder::new(name);
    for (column, data_type) in columns {
        let data_type = data_type
            .as_str()
            .ok_or_else(|| Error::invalid_schema(format!("Type of {} is not a string", column)))?
            .parse::<DataType>()?;
        builder = builder.add_column(column.clone(), data_type)?;
    }
    finish(builder, options)
}

fn finish(mut builder: SchemaBuilder, options: &TableOptions) -> Result<TableSchema> {
    if let Some(index) = &options.index {
        builder = builder.add_primary_key(index)?;
    }
    builder.build()
}

/// Picks the type of a field from its non-null samples.
///
/// All-numeric samples are integer unless one has a fractional part. Samples
/// sharing one other type take that type. Mixed or empty samples are string.
pub fn infer_type(samples: &[&Value]) -> DataType {
    let Some(first) = samples.first() else {
        return DataType::String;
    };
    if samples.iter().all(|v| v.is_numeric()) {
        let fractional = samples
            .iter()
            .any(|v| matches!(v, Value::Float64(f) if !f.is_finite() || f.fract() != 0.0));
        return if fractional {
            DataType::Float64
        } else {
            DataType::Int64
        };
    }
    match first.data_type() {
        Some(t) if samples.iter().all(|v| v.data_type() == Some(t)) => t,
        _ => DataType::String,
    }
}

/// Infers a schema from the first [`INFERENCE_SAMPLE`] non-null values of
/// every field, in first-seen field order.
pub fn infer_schema(name: &str, rows: &[Payload], options: &TableOptions) -> Result<TableSchema> {
    let mut samples: Vec<(&str, Vec<&Value>)> = Vec::new();
    for payload in rows {
        for (field, value) in payload.fields() {
            let slot = match samples.iter().position(|(n, _)| n == field) {
                Some(slot) => slot,
                None => {
                    samples.push((field, Vec::new()));
                    samples.len() - 1
                }
            };
            let values = &mut samples[slot].1;
            if !value.is_null() && values.len() < INFERENCE_SAMPLE {
                values.push(value);
            }
        }
    }

    let mut builder = SchemaBuilder::new(name);
    for (field, values) in &samples {
        builder = builder.add_column(*field, infer_type(values))?;
    }
    let schema = finish(builder, options)?;
    debug!(
        "inferred schema for {}: {:?}",
        name,
        schema
            .columns()
            .iter()
            .map(|c| (c.name(), c.data_type().name()))
            .collect::<Vec<_>>()
    );
    Ok(schema)
}

/// Renders cells of inferred string columns as text, so a field with mixed
/// samples loads instead of failing coercion.
pub fn stringify_mixed(rows: &mut [Payload], schema: &TableSchema) {
    for payload in rows.iter_mut() {
        let mixed: Vec<(String, String)> = payload
            .fields()
            .iter()
            .filter(|(name, value)| {
                !value.is_null()
                    && value.data_type() != Some(DataType::String)
                    && schema.get_column(name).map(|c| c.data_type()) == Some(DataType::String)
            })
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        for (name, text) in mixed {
            payload.set(name, text);
        }
    }
}
