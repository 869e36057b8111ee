//! SQLite implementation of the catalog port.
//!
//! Uses the `pragma_*` table-valued functions so table and index names are
//! bound as parameters instead of spliced into PRAGMA text.

use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use vectable_core::catalog::{Catalog, ColumnDescriptor, IndexDescriptor, IndexOrigin};
use vectable_types::error::StoreError;

use super::value::storage;

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Catalog for SqliteCatalog {
    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.is_some())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter()
            .map(|row| -> Result<ColumnDescriptor, sqlx::Error> {
                Ok(ColumnDescriptor {
                    name: row.try_get("name")?,
                    declared_type: row.try_get("type")?,
                    not_null: row.try_get::<i64, _>("notnull")? != 0,
                    default: row.try_get("dflt_value")?,
                    primary_key: row.try_get::<i64, _>("pk")? > 0,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(storage)
    }

    async fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT name, "unique", origin, partial FROM pragma_index_list(?) ORDER BY seq"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter()
            .map(|row| -> Result<IndexDescriptor, sqlx::Error> {
                Ok(IndexDescriptor {
                    name: row.try_get("name")?,
                    unique: row.try_get::<i64, _>("unique")? != 0,
                    origin: IndexOrigin::from_code(row.try_get::<&str, _>("origin")?),
                    partial: row.try_get::<i64, _>("partial")? != 0,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(storage)
    }

    async fn index_columns(&self, index: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
            .bind(index)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        // Expression index members have no name.
        rows.iter()
            .map(|row| row.try_get::<Option<String>, _>("name"))
            .filter_map(Result::transpose)
            .collect::<Result<_, sqlx::Error>>()
            .map_err(storage)
    }
}
