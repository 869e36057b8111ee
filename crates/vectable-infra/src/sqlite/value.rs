//! Conversions between domain [`Value`]s and SQLite parameters/columns.

use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Row, TypeInfo, ValueRef};

use vectable_core::record::Statement;
use vectable_types::error::StoreError;
use vectable_types::vector::{Value, format_timestamp};

pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) fn storage(err: sqlx::Error) -> StoreError {
    StoreError::Storage(err.to_string())
}

pub(crate) fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(i) => query.bind(*i),
        Value::Real(r) => query.bind(*r),
        Value::Text(s) => query.bind(s.clone()),
        Value::Blob(b) => query.bind(b.clone()),
        Value::Timestamp(ts) => query.bind(format_timestamp(ts)),
    }
}

/// Prepare a statement with its positional parameters bound in order.
pub(crate) fn prepare(statement: &Statement) -> SqliteQuery<'_> {
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), bind_value)
}

/// Read column `index` as whatever storage class the value actually has.
pub(crate) fn native_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    Ok(match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get(index)?),
        "REAL" => Value::Real(row.try_get(index)?),
        "BLOB" => Value::Blob(row.try_get(index)?),
        _ => Value::Text(row.try_get(index)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_bound_values_read_back_natively() {
        let pool = DatabasePool::in_memory().await.unwrap();
        sqlx::query("CREATE TABLE t (a, b, c, d, e, f)")
            .execute(&pool.writer)
            .await
            .unwrap();

        let ts = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        let insert = Statement {
            sql: "INSERT INTO t (a, b, c, d, e, f) VALUES (?, ?, ?, ?, ?, ?)".to_string(),
            params: vec![
                Value::Null,
                Value::Integer(7),
                Value::Real(0.25),
                Value::Text("hello".to_string()),
                Value::Blob(vec![1, 2, 3]),
                Value::Timestamp(ts),
            ],
        };
        prepare(&insert).execute(&pool.writer).await.unwrap();

        let row = sqlx::query("SELECT a, b, c, d, e, f FROM t")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        let values: Vec<Value> = (0..6).map(|i| native_value(&row, i).unwrap()).collect();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Integer(7),
                Value::Real(0.25),
                Value::Text("hello".to_string()),
                Value::Blob(vec![1, 2, 3]),
                Value::Text("2023-05-01T00:00:00.000000Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_storage_error_keeps_message() {
        let err = storage(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Storage(msg) if msg.contains("no rows")));
    }
}
