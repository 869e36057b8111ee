//! Catalog port and schema reconstruction.
//!
//! The backend exposes four read-only catalog queries through [`Catalog`];
//! [`read_schema`] assembles them into a [`Schema`] that compares equal to the
//! one that created the table. Implementations live in vectable-infra.

use vectable_types::error::StoreError;
use vectable_types::schema::{Column, ColumnType, Index, Schema};

/// Prefix the backend uses for indexes it creates for PRIMARY KEY / UNIQUE
/// constraints.
pub const IMPLICIT_INDEX_PREFIX: &str = "sqlite_autoindex_";

/// One row of column metadata, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

/// How an index came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    /// `CREATE INDEX`.
    Created,
    /// UNIQUE constraint.
    Unique,
    /// PRIMARY KEY constraint.
    PrimaryKey,
}

impl IndexOrigin {
    /// Parse the backend's one-letter origin code (`c`, `u`, `pk`).
    pub fn from_code(code: &str) -> Self {
        match code {
            "u" => IndexOrigin::Unique,
            "pk" => IndexOrigin::PrimaryKey,
            _ => IndexOrigin::Created,
        }
    }
}

/// One row of index metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    pub name: String,
    pub unique: bool,
    pub origin: IndexOrigin,
    pub partial: bool,
}

impl IndexDescriptor {
    /// Whether the backend generated this index rather than the schema.
    pub fn is_implicit(&self) -> bool {
        self.origin != IndexOrigin::Created || self.name.starts_with(IMPLICIT_INDEX_PREFIX)
    }
}

/// Read-only catalog protocol.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Catalog: Send + Sync {
    fn table_exists(
        &self,
        table: &str,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    fn columns(
        &self,
        table: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ColumnDescriptor>, StoreError>> + Send;

    fn indexes(
        &self,
        table: &str,
    ) -> impl std::future::Future<Output = Result<Vec<IndexDescriptor>, StoreError>> + Send;

    /// Member column names of an index, in index order. `index` is the
    /// backend's full index name.
    fn index_columns(
        &self,
        index: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// Reconstruct the schema of `table` from the catalog.
///
/// Returns `Ok(None)` when the table does not exist.
pub async fn read_schema<C: Catalog>(
    catalog: &C,
    table: &str,
) -> Result<Option<Schema>, StoreError> {
    if !catalog.table_exists(table).await? {
        return Ok(None);
    }

    let columns: Vec<Column> = catalog
        .columns(table)
        .await?
        .into_iter()
        .map(|d| Column {
            name: d.name,
            column_type: ColumnType::from(d.declared_type),
            required: d.not_null,
            default: d.default,
            primary_key: d.primary_key,
        })
        .collect();

    let prefix = format!("{table}_");
    let mut indexes = Vec::new();
    for descriptor in catalog.indexes(table).await? {
        if descriptor.is_implicit() {
            continue;
        }

        let members = catalog.index_columns(&descriptor.name).await?;
        let resolved: Vec<String> = members
            .into_iter()
            .filter(|name| columns.iter().any(|c| &c.name == name))
            .collect();

        let name = descriptor
            .name
            .strip_prefix(&prefix)
            .unwrap_or(&descriptor.name)
            .to_string();
        indexes.push(Index {
            name,
            columns: resolved,
        });
    }

    Ok(Some(Schema {
        name: table.to_string(),
        columns,
        indexes,
    }))
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::*;

    /// In-memory catalog that serves canned descriptors.
    #[derive(Default)]
    pub struct FakeCatalog {
        pub tables: HashMap<String, (Vec<ColumnDescriptor>, Vec<IndexDescriptor>)>,
        pub members: HashMap<String, Vec<String>>,
    }

    impl FakeCatalog {
        /// Describe `schema` the way the backend would after creating it.
        pub fn from_schema(schema: &Schema) -> Self {
            let mut catalog = FakeCatalog::default();
            let columns = schema
                .columns
                .iter()
                .map(|c| ColumnDescriptor {
                    name: c.name.clone(),
                    declared_type: c.column_type.to_string(),
                    not_null: c.required,
                    default: c.default.clone(),
                    primary_key: c.primary_key,
                })
                .collect();
            let mut indexes: Vec<IndexDescriptor> = schema
                .indexes
                .iter()
                .map(|i| IndexDescriptor {
                    name: i.qualified_name(&schema.name),
                    unique: false,
                    origin: IndexOrigin::Created,
                    partial: false,
                })
                .collect();
            for index in &schema.indexes {
                catalog
                    .members
                    .insert(index.qualified_name(&schema.name), index.columns.clone());
            }
            if schema.columns.iter().any(|c| c.primary_key) {
                indexes.push(IndexDescriptor {
                    name: format!("{IMPLICIT_INDEX_PREFIX}{}_1", schema.name),
                    unique: true,
                    origin: IndexOrigin::PrimaryKey,
                    partial: false,
                });
            }
            catalog
                .tables
                .insert(schema.name.clone(), (columns, indexes));
            catalog
        }
    }

    impl Catalog for FakeCatalog {
        async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
            Ok(self.tables.contains_key(table))
        }

        async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, StoreError> {
            Ok(self.tables.get(table).map(|t| t.0.clone()).unwrap_or_default())
        }

        async fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>, StoreError> {
            Ok(self.tables.get(table).map(|t| t.1.clone()).unwrap_or_default())
        }

        async fn index_columns(&self, index: &str) -> Result<Vec<String>, StoreError> {
            Ok(self.members.get(index).cloned().unwrap_or_default())
        }
    }
}
