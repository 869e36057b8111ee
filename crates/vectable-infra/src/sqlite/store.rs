//! SQLite-backed vector store.
//!
//! Owns the desired schema and the embedding configuration. Inserts go
//! through the writer pool; queries and counts use the reader pool.

use sqlx::Row;

use vectable_core::record::{
    self, SimilarityResults, count_statement, decode_row, insert_statement, select_statement,
    validate_filter, validate_insert,
};
use vectable_core::similarity::compute_set;
use vectable_types::config::{FilterOptions, VectorConfig};
use vectable_types::error::{StoreError, ValidationError};
use vectable_types::filter::Filter;
use vectable_types::schema::{Column, ColumnType, DEFAULT_SCHEMA_NAME, Schema, VECTOR_COLUMN};
use vectable_types::vector::Vector;

use super::migrator::{MigrationReport, Migrator};
use super::pool::DatabasePool;
use super::value::{native_value, prepare, storage};

pub struct SqliteVectorStore {
    pool: DatabasePool,
    schema: Schema,
    config: VectorConfig,
}

impl SqliteVectorStore {
    /// Build a store over `schema`.
    ///
    /// An empty schema name becomes [`DEFAULT_SCHEMA_NAME`] and a nullable
    /// `vector BLOB` column is appended if the schema does not declare one.
    /// Nothing touches the database until [`Self::migrate`] or a record
    /// operation runs.
    pub fn new(
        pool: DatabasePool,
        mut schema: Schema,
        config: VectorConfig,
    ) -> Result<Self, StoreError> {
        if config.length == 0 {
            return Err(ValidationError::EmptyDimension.into());
        }

        if schema.name.is_empty() {
            schema.name = DEFAULT_SCHEMA_NAME.to_string();
        }

        match schema.column(VECTOR_COLUMN) {
            None => schema
                .columns
                .push(Column::new(VECTOR_COLUMN, ColumnType::Blob)),
            Some(column) if column.column_type != ColumnType::Blob => {
                return Err(ValidationError::ReservedColumn(VECTOR_COLUMN.to_string()).into());
            }
            Some(_) => {}
        }

        schema.validate()?;

        Ok(Self {
            pool,
            schema,
            config,
        })
    }

    /// The desired schema, including the embedding column.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &VectorConfig {
        &self.config
    }

    fn migrator(&self) -> Migrator {
        Migrator::new(self.pool.clone())
    }

    /// The table as it currently exists, or `None`.
    pub async fn live_schema(&self) -> Result<Option<Schema>, StoreError> {
        self.migrator().live_schema(&self.schema.name).await
    }

    /// Statements [`Self::migrate`] would run, without running them.
    pub async fn plan_migration(&self) -> Result<Vec<String>, StoreError> {
        let (_, statements) = self.migrator().pending(&self.schema).await?;
        Ok(statements)
    }

    /// Create or reconcile the live table against the desired schema.
    ///
    /// Callers must not run two migrations on the same table concurrently.
    pub async fn migrate(&self) -> Result<MigrationReport, StoreError> {
        self.migrator().migrate(&self.schema).await
    }

    pub async fn insert(&self, vector: &Vector) -> Result<(), StoreError> {
        validate_insert(&self.schema, &self.config, vector)?;

        let statement = insert_statement(&self.schema, vector);
        prepare(&statement)
            .execute(&self.pool.writer)
            .await
            .map_err(storage)?;

        tracing::trace!(table = %self.schema.name, "inserted vector");
        Ok(())
    }

    /// Every record matching `filter`, in backend order.
    pub async fn query(&self, filter: Option<&Filter>) -> Result<Vec<Vector>, StoreError> {
        validate_filter(&self.schema, filter)?;

        let statement = select_statement(&self.schema, filter);
        let rows = prepare(&statement)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(storage)?;

        let width = self.schema.columns.len();
        let mut vectors = Vec::with_capacity(rows.len());
        for row in &rows {
            let natives = (0..width)
                .map(|i| native_value(row, i))
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage)?;
            vectors.push(decode_row(&self.schema, natives)?);
        }

        tracing::debug!(table = %self.schema.name, rows = vectors.len(), "queried vectors");
        Ok(vectors)
    }

    /// Number of records matching `filter`.
    pub async fn count(&self, filter: Option<&Filter>) -> Result<u64, StoreError> {
        validate_filter(&self.schema, filter)?;

        let statement = count_statement(&self.schema, filter);
        let row = prepare(&statement)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(storage)?;
        let count: i64 = row.try_get(0).map_err(storage)?;
        Ok(count.max(0) as u64)
    }

    /// Records matching `filter`, scored against `target` and ranked.
    ///
    /// `options` of `None` uses [`FilterOptions::default`].
    pub async fn query_similarity(
        &self,
        target: &[f64],
        filter: Option<&Filter>,
        options: Option<&FilterOptions>,
    ) -> Result<SimilarityResults, StoreError> {
        if target.len() != self.config.length {
            return Err(ValidationError::DimensionMismatch {
                expected: self.config.length,
                actual: target.len(),
            }
            .into());
        }
        let options = options.copied().unwrap_or_default();

        let candidates = self.query(filter).await?;
        let scores = compute_set(target, &candidates, &options.similarity)?;
        let results = record::rank(candidates, scores, &options);

        tracing::debug!(
            table = %self.schema.name,
            method = %options.similarity.method,
            kept = results.len(),
            "similarity query"
        );
        Ok(results)
    }
}
