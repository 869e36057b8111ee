//! Applies migration plans to a live SQLite table.
//!
//! Statements run one at a time on the writer pool and are not wrapped in a
//! transaction; the first failure aborts the run and leaves the statements
//! already executed in place.

use serde::Serialize;
use vectable_core::catalog::read_schema;
use vectable_core::migrate::{create_plan, plan};
use vectable_types::error::StoreError;
use vectable_types::schema::Schema;

use super::catalog::SqliteCatalog;
use super::pool::DatabasePool;
use super::value::storage;

/// What a call to [`Migrator::migrate`] did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    /// The table did not exist and was created from scratch.
    pub created: bool,
    /// Statements executed, in order.
    pub statements: Vec<String>,
}

impl MigrationReport {
    /// The live table already matched.
    pub fn is_noop(&self) -> bool {
        self.statements.is_empty()
    }
}

pub struct Migrator {
    pool: DatabasePool,
}

impl Migrator {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Read the live structure of `table`, or `None` if it does not exist.
    ///
    /// Goes through the writer so the result reflects DDL that just ran.
    pub async fn live_schema(&self, table: &str) -> Result<Option<Schema>, StoreError> {
        let catalog = SqliteCatalog::new(self.pool.writer.clone());
        read_schema(&catalog, table).await
    }

    /// Statements `migrate` would execute right now, plus whether they
    /// create the table from nothing.
    pub async fn pending(&self, desired: &Schema) -> Result<(bool, Vec<String>), StoreError> {
        match self.live_schema(&desired.name).await? {
            None => Ok((true, create_plan(desired))),
            Some(current) => Ok((false, plan(&current, desired))),
        }
    }

    /// Bring the live table in line with `desired`.
    pub async fn migrate(&self, desired: &Schema) -> Result<MigrationReport, StoreError> {
        let (created, statements) = self.pending(desired).await?;

        if statements.is_empty() {
            tracing::debug!(table = %desired.name, "schema up to date");
            return Ok(MigrationReport::default());
        }

        for sql in &statements {
            tracing::debug!(table = %desired.name, %sql, "executing migration statement");
            sqlx::query(sql)
                .execute(&self.pool.writer)
                .await
                .map_err(storage)?;
        }

        tracing::info!(
            table = %desired.name,
            created,
            statements = statements.len(),
            "migrated schema"
        );

        Ok(MigrationReport {
            created,
            statements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vectable_types::schema::{Column, ColumnType, Index};

    fn id() -> Column {
        Column::new("id", ColumnType::Text).required().primary_key()
    }

    fn user() -> Column {
        Column::new("user", ColumnType::Other("INT".to_string()))
    }

    fn created_at() -> Column {
        Column::new("created_at", ColumnType::Timestamp)
            .required()
            .with_default("CURRENT_TIMESTAMP")
    }

    fn fake() -> Column {
        Column::new("fake", ColumnType::Text)
    }

    fn base_schema() -> Schema {
        Schema::new(
            "TestSchemaPlsIgnore",
            vec![id(), user(), created_at()],
            vec![
                Index::new("id", ["id"]),
                Index::new("user", ["user"]),
                Index::new("created_at", ["created_at"]),
                Index::new("user_created_at", ["user", "created_at"]),
            ],
        )
    }

    async fn file_pool() -> (tempfile::TempDir, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("migrate.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_migrate_creates_absent_table() {
        let (_dir, pool) = file_pool().await;
        let migrator = Migrator::new(pool);
        let schema = base_schema();

        let report = migrator.migrate(&schema).await.unwrap();
        assert!(report.created);
        assert_eq!(report.statements.len(), 5);

        let live = migrator.live_schema(&schema.name).await.unwrap().unwrap();
        assert_eq!(live, schema);
    }

    #[tokio::test]
    async fn test_second_migrate_is_noop() {
        let (_dir, pool) = file_pool().await;
        let migrator = Migrator::new(pool);
        let schema = base_schema();

        migrator.migrate(&schema).await.unwrap();
        let report = migrator.migrate(&schema).await.unwrap();
        assert!(report.is_noop());
        assert!(!report.created);
    }

    #[tokio::test]
    async fn test_index_only_change_applies_in_place() {
        let (_dir, pool) = file_pool().await;
        let migrator = Migrator::new(pool);
        let current = base_schema();
        migrator.migrate(&current).await.unwrap();

        let mut desired = base_schema();
        desired.indexes.retain(|i| i.name != "created_at");
        desired.indexes.push(Index::new("id_user", ["id", "user"]));

        let report = migrator.migrate(&desired).await.unwrap();
        assert_eq!(
            report.statements,
            vec![
                "DROP INDEX IF EXISTS TestSchemaPlsIgnore_created_at".to_string(),
                "CREATE INDEX IF NOT EXISTS TestSchemaPlsIgnore_id_user ON TestSchemaPlsIgnore(id, user)"
                    .to_string(),
            ]
        );

        let live = migrator.live_schema(&desired.name).await.unwrap().unwrap();
        assert_eq!(live, desired);
    }

    #[tokio::test]
    async fn test_rebuild_preserves_retained_columns() {
        let (_dir, pool) = file_pool().await;
        let migrator = Migrator::new(pool.clone());
        let current = base_schema();
        migrator.migrate(&current).await.unwrap();

        for i in 0..1000 {
            sqlx::query("INSERT INTO TestSchemaPlsIgnore (id, user) VALUES (?, ?)")
                .bind(format!("id-{i}"))
                .bind(i % 17)
                .execute(&pool.writer)
                .await
                .unwrap();
        }

        let desired = Schema::new(
            "TestSchemaPlsIgnore",
            vec![id(), user(), fake()],
            vec![Index::new("id", ["id"]), Index::new("user", ["user"])],
        );
        let report = migrator.migrate(&desired).await.unwrap();
        assert!(!report.created);
        assert_eq!(
            report.statements.last().map(String::as_str),
            Some("DROP TABLE IF EXISTS TestSchemaPlsIgnore_tmp")
        );

        let rows: Vec<(String, i64, Option<String>)> =
            sqlx::query_as("SELECT id, user, fake FROM TestSchemaPlsIgnore")
                .fetch_all(&pool.reader)
                .await
                .unwrap();
        assert_eq!(rows.len(), 1000);
        let by_id: HashMap<String, (i64, Option<String>)> = rows
            .into_iter()
            .map(|(row_id, row_user, row_fake)| (row_id, (row_user, row_fake)))
            .collect();
        for i in 0..1000 {
            let (row_user, row_fake) = &by_id[&format!("id-{i}")];
            assert_eq!(*row_user, i % 17);
            assert!(row_fake.is_none());
        }

        assert!(
            migrator
                .live_schema("TestSchemaPlsIgnore_tmp")
                .await
                .unwrap()
                .is_none()
        );
        let live = migrator.live_schema(&desired.name).await.unwrap().unwrap();
        assert_eq!(live, desired);
    }

    #[tokio::test]
    async fn test_failed_statement_surfaces_storage_error() {
        let (_dir, pool) = file_pool().await;
        let migrator = Migrator::new(pool);
        let current = Schema::new(
            "broken",
            vec![Column::new("a", ColumnType::Text)],
            vec![Index::new("missing", ["a"])],
        );
        migrator.migrate(&current).await.unwrap();

        // An index over a column the table lacks fails at execution.
        let desired = Schema::new(
            "broken",
            vec![Column::new("a", ColumnType::Text)],
            vec![Index::new("missing", ["a"]), Index::new("ghost", ["nope"])],
        );
        let err = migrator.migrate(&desired).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(msg) if msg.contains("nope")));
    }
}
