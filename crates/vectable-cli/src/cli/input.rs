//! Parsing of command-line record, embedding, and predicate arguments.
//!
//! Values are typed by the declared column. Keys that name no column are
//! passed through untyped so the store reports them.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value as Json;

use vectable_types::config::FilterOptions;
use vectable_types::filter::{Filter, Operator, Predicate};
use vectable_types::schema::{ColumnType, Schema};
use vectable_types::vector::{Value, Vector};

use super::SearchArgs;

fn column_type(schema: &Schema, column: &str) -> ColumnType {
    schema
        .column(column)
        .map(|c| c.column_type.clone())
        .unwrap_or_else(|| ColumnType::Other(String::new()))
}

pub fn parse_embedding(raw: &str) -> Result<Vec<f64>> {
    serde_json::from_str(raw).with_context(|| format!("embedding must be a JSON array of numbers: {raw}"))
}

pub fn parse_metadata(schema: &Schema, raw: &str) -> Result<BTreeMap<String, Value>> {
    let json: Json = serde_json::from_str(raw).context("metadata is not valid JSON")?;
    let Json::Object(fields) = json else {
        bail!("metadata must be a JSON object");
    };

    fields
        .iter()
        .map(|(column, value)| -> Result<(String, Value)> {
            let typed = Value::from_json(column, &column_type(schema, column), value)?;
            Ok((column.clone(), typed))
        })
        .collect()
}

pub fn parse_vector(schema: &Schema, metadata: &str, embedding: &str) -> Result<Vector> {
    Ok(Vector {
        metadata: parse_metadata(schema, metadata)?,
        embedding: parse_embedding(embedding)?,
    })
}

/// Parse `column:op:value`. Everything after the second `:` is the value.
pub fn parse_predicate(schema: &Schema, raw: &str) -> Result<Predicate> {
    let mut parts = raw.splitn(3, ':');
    let (Some(column), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("predicate '{raw}' is not of the form column:op:value");
    };
    let operator: Operator = op.parse().map_err(|e: String| anyhow!(e))?;

    let ty = column_type(schema, column);
    let json = match ty {
        ColumnType::Text | ColumnType::Timestamp => Json::String(value.to_string()),
        _ => serde_json::from_str(value).unwrap_or_else(|_| Json::String(value.to_string())),
    };
    let value = Value::from_json(column, &ty, &json)?;

    Ok(Predicate {
        column: column.to_string(),
        operator,
        value,
    })
}

/// `None` when no predicates were given.
pub fn parse_filter(schema: &Schema, predicates: &[String]) -> Result<Option<Filter>> {
    if predicates.is_empty() {
        return Ok(None);
    }
    let predicates = predicates
        .iter()
        .map(|raw| parse_predicate(schema, raw))
        .collect::<Result<_>>()?;
    Ok(Some(Filter { predicates }))
}

/// Apply command-line overrides on top of the configured search options.
pub fn search_options(base: FilterOptions, args: &SearchArgs) -> FilterOptions {
    let mut options = base;
    if let Some(method) = args.method {
        options.similarity.method = method;
    }
    if let Some(workers) = args.workers {
        options.similarity.workers = Some(workers);
    }
    if let Some(std_deviations) = args.std_deviations {
        options.std_deviations = std_deviations;
    }
    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    options
}
