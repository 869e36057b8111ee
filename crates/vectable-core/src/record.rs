//! Record validation, statement building, row coercion, and ranking.
//!
//! Everything here is backend-agnostic: statements are produced as SQL text
//! plus positional parameters, and rows come back as native [`Value`]s that
//! [`coerce`] maps onto the declared column types.

use std::cmp::Ordering;
use std::collections::HashSet;

use vectable_types::config::{FilterOptions, VectorConfig};
use vectable_types::error::{FormatError, ValidationError};
use vectable_types::filter::Filter;
use vectable_types::schema::{Column, ColumnType, Schema, VECTOR_COLUMN};
use vectable_types::vector::{Value, Vector, parse_timestamp};

use crate::codec;

/// A parameterized statement ready for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Check a record against the schema before insert.
///
/// Order of checks: dimension, unknown keys, value types, required keys.
pub fn validate_insert(
    schema: &Schema,
    config: &VectorConfig,
    vector: &Vector,
) -> Result<(), ValidationError> {
    if vector.embedding.len() != config.length {
        return Err(ValidationError::DimensionMismatch {
            expected: config.length,
            actual: vector.embedding.len(),
        });
    }

    let declared: HashSet<&str> = schema
        .columns
        .iter()
        .filter(|c| c.name != VECTOR_COLUMN)
        .map(|c| c.name.as_str())
        .collect();
    if let Some(unknown) = vector.metadata.keys().find(|k| !declared.contains(k.as_str())) {
        return Err(ValidationError::UnknownColumn(unknown.clone()));
    }

    for column in &schema.columns {
        let Some(value) = vector.metadata.get(&column.name) else {
            continue;
        };
        if !accepts(&column.column_type, value) {
            return Err(ValidationError::TypeMismatch {
                column: column.name.clone(),
                expected: column.column_type.to_string(),
                actual: value.kind().to_string(),
            });
        }
    }

    if let Some(missing) = schema.columns.iter().find(|c| {
        c.required
            && c.name != VECTOR_COLUMN
            && vector.metadata.get(&c.name).is_none_or(Value::is_null)
    }) {
        return Err(ValidationError::MissingRequired(missing.name.clone()));
    }

    Ok(())
}

/// Whether a value can be stored in a column and read back as its type.
///
/// NULL fits anywhere, integers widen into REAL, and columns of unrecognised
/// type take any value.
fn accepts(column_type: &ColumnType, value: &Value) -> bool {
    matches!(
        (column_type, value),
        (_, Value::Null)
            | (ColumnType::Other(_), _)
            | (ColumnType::Integer, Value::Integer(_))
            | (ColumnType::Real, Value::Real(_) | Value::Integer(_))
            | (ColumnType::Text, Value::Text(_))
            | (ColumnType::Blob, Value::Blob(_))
            | (ColumnType::Timestamp, Value::Timestamp(_))
    )
}

/// `INSERT` covering every column in declared order.
pub fn insert_statement(schema: &Schema, vector: &Vector) -> Statement {
    let names = schema.column_names();
    let placeholders = vec!["?"; names.len()].join(", ");
    let params = schema
        .columns
        .iter()
        .map(|column| {
            if column.name == VECTOR_COLUMN {
                Value::Blob(codec::encode(&vector.embedding))
            } else {
                vector.metadata.get(&column.name).cloned().unwrap_or(Value::Null)
            }
        })
        .collect();

    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            schema.name,
            names.join(", ")
        ),
        params,
    }
}

/// Reject predicates on undeclared columns or on the embedding column.
pub fn validate_filter(schema: &Schema, filter: Option<&Filter>) -> Result<(), ValidationError> {
    let Some(filter) = filter else {
        return Ok(());
    };
    for predicate in &filter.predicates {
        if !schema.has_column(&predicate.column) {
            return Err(ValidationError::UnknownColumn(predicate.column.clone()));
        }
        if predicate.column == VECTOR_COLUMN {
            return Err(ValidationError::ReservedColumn(predicate.column.clone()));
        }
    }
    Ok(())
}

fn where_clause(filter: Option<&Filter>) -> (String, Vec<Value>) {
    let Some(filter) = filter.filter(|f| !f.is_empty()) else {
        return (String::new(), Vec::new());
    };
    let conditions: Vec<String> = filter
        .predicates
        .iter()
        .map(|p| format!("{} {} ?", p.column, p.operator.as_sql()))
        .collect();
    let params = filter.predicates.iter().map(|p| p.value.clone()).collect();
    (format!(" WHERE {}", conditions.join(" AND ")), params)
}

/// `SELECT` of every declared column, narrowed by the filter.
pub fn select_statement(schema: &Schema, filter: Option<&Filter>) -> Statement {
    let (clause, params) = where_clause(filter);
    Statement {
        sql: format!(
            "SELECT {} FROM {}{clause}",
            schema.column_names().join(", "),
            schema.name
        ),
        params,
    }
}

pub fn count_statement(schema: &Schema, filter: Option<&Filter>) -> Statement {
    let (clause, params) = where_clause(filter);
    Statement {
        sql: format!("SELECT COUNT(*) FROM {}{clause}", schema.name),
        params,
    }
}

/// Map a backend-native value onto the column's declared type.
///
/// Columns of unrecognised type keep the native value.
pub fn coerce(column: &Column, native: Value) -> Result<Value, FormatError> {
    let mismatch = |native: &Value| FormatError::TypeMismatch {
        column: column.name.clone(),
        expected: column.column_type.to_string(),
        actual: native.kind().to_string(),
    };

    match (&column.column_type, native) {
        (_, Value::Null) => Ok(Value::Null),
        (ColumnType::Other(_), native) => Ok(native),
        (ColumnType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
        (ColumnType::Real, Value::Real(r)) => Ok(Value::Real(r)),
        (ColumnType::Real, Value::Integer(i)) => Ok(Value::Real(i as f64)),
        (ColumnType::Text, Value::Text(s)) => Ok(Value::Text(s)),
        (ColumnType::Blob, Value::Blob(b)) => Ok(Value::Blob(b)),
        (ColumnType::Blob, Value::Text(s)) => Ok(Value::Blob(s.into_bytes())),
        (ColumnType::Timestamp, Value::Text(s)) => parse_timestamp(&s).map(Value::Timestamp),
        (ColumnType::Timestamp, Value::Integer(secs)) => {
            chrono::DateTime::from_timestamp(secs, 0)
                .map(Value::Timestamp)
                .ok_or_else(|| mismatch(&Value::Integer(secs)))
        }
        (_, native) => Err(mismatch(&native)),
    }
}

/// Build a record from one row of native values, in declared column order.
///
/// NULL columns are left out of the metadata.
pub fn decode_row(schema: &Schema, row: Vec<Value>) -> Result<Vector, FormatError> {
    let mut vector = Vector::default();
    for (column, native) in schema.columns.iter().zip(row) {
        if column.name == VECTOR_COLUMN {
            match native {
                Value::Blob(bytes) => vector.embedding = codec::decode(&bytes)?,
                Value::Null => {}
                other => {
                    return Err(FormatError::TypeMismatch {
                        column: column.name.clone(),
                        expected: ColumnType::Blob.to_string(),
                        actual: other.kind().to_string(),
                    });
                }
            }
            continue;
        }
        let value = coerce(column, native)?;
        if !value.is_null() {
            vector.metadata.insert(column.name.clone(), value);
        }
    }
    Ok(vector)
}

/// Ranked similarity results; `vectors[i]` scored `scores[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityResults {
    pub vectors: Vec<Vector>,
    pub scores: Vec<f64>,
}

impl SimilarityResults {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vector, f64)> {
        self.vectors.iter().zip(self.scores.iter().copied())
    }
}

/// Population mean and standard deviation.
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Sort by descending score, apply the outlier cutoff, then the limit.
///
/// The cutoff keeps the longest prefix scoring at least
/// `mean + std_deviations * std_dev` over all scores; it may keep nothing.
pub fn rank(vectors: Vec<Vector>, scores: Vec<f64>, options: &FilterOptions) -> SimilarityResults {
    let mut ranked: Vec<(Vector, f64)> = vectors.into_iter().zip(scores).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    if options.std_deviations > 0.0 && !ranked.is_empty() {
        let all: Vec<f64> = ranked.iter().map(|(_, s)| *s).collect();
        let (mean, std_dev) = mean_and_std_dev(&all);
        let threshold = mean + options.std_deviations * std_dev;
        let keep = ranked.iter().take_while(|(_, s)| *s >= threshold).count();
        tracing::trace!(mean, std_dev, threshold, keep, "outlier cutoff");
        ranked.truncate(keep);
    }

    if options.limit > 0 {
        ranked.truncate(options.limit);
    }

    let (vectors, scores) = ranked.into_iter().unzip();
    SimilarityResults { vectors, scores }
}
