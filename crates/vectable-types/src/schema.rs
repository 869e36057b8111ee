//! Table schema model: columns, indexes, and the DDL that creates them.
//!
//! Equality between schemas is structural and order-independent, so a schema
//! reconstructed from the live catalog compares equal to the one that created
//! the table regardless of how the catalog orders its rows.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name of the reserved binary column that stores the encoded embedding.
pub const VECTOR_COLUMN: &str = "vector";

/// Schema name used when the caller leaves it empty.
pub const DEFAULT_SCHEMA_NAME: &str = "VectorCollection";

/// Logical column type.
///
/// Declared types the store does not recognise are kept verbatim in `Other`
/// so that reading a table back from the catalog reproduces the
/// declaration (e.g. `INT`, `VARCHAR(32)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Blob,
    Timestamp,
    Other(String),
}

impl ColumnType {
    /// The type name as it appears in DDL.
    pub fn as_sql(&self) -> &str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Other(declared) => declared,
        }
    }
}

impl From<&str> for ColumnType {
    fn from(declared: &str) -> Self {
        match declared.to_ascii_uppercase().as_str() {
            "TEXT" => ColumnType::Text,
            "INTEGER" => ColumnType::Integer,
            "REAL" => ColumnType::Real,
            "BLOB" => ColumnType::Blob,
            "TIMESTAMP" => ColumnType::Timestamp,
            _ => ColumnType::Other(declared.to_string()),
        }
    }
}

impl From<String> for ColumnType {
    fn from(declared: String) -> Self {
        ColumnType::from(declared.as_str())
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.as_sql().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub required: bool,
    /// Default literal, emitted as-is after `DEFAULT`.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
}

impl Column {
    /// An optional column with no default and no key.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            required: false,
            default: None,
            primary_key: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Column clause for `CREATE TABLE`.
    ///
    /// Clause order is fixed: `NOT NULL`, `PRIMARY KEY`, `DEFAULT`.
    pub fn column_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type);
        if self.required {
            sql.push_str(" NOT NULL");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.column_type)?;
        if self.primary_key {
            f.write_str(" (primary key)")?;
        } else if self.required {
            f.write_str(" (required)")?;
        }
        Ok(())
    }
}

/// A secondary index over one or more columns, referenced by name.
///
/// Two indexes are equal when they share a name and the same columns counted
/// with multiplicity; column order only matters for the emitted DDL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
}

impl Index {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// The index name as stored by the backend: `<table>_<name>`.
    pub fn qualified_name(&self, table: &str) -> String {
        format!("{table}_{}", self.name)
    }

    pub fn create_index_sql(&self, table: &str) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {table}({})",
            self.qualified_name(table),
            self.columns.join(", ")
        )
    }

    pub fn drop_index_sql(&self, table: &str) -> String {
        format!("DROP INDEX IF EXISTS {}", self.qualified_name(table))
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.columns.len() != other.columns.len() {
            return false;
        }
        let mut ours: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other.columns.iter().map(String::as_str).collect();
        ours.sort_unstable();
        theirs.sort_unstable();
        ours == theirs
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - ({})", self.name, self.columns.join(", "))
    }
}

/// Declared structure of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Schema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>, indexes: Vec<Index>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Check the structural invariants: unique column names and index
    /// columns that exist in this schema.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ValidationError::DuplicateColumn(column.name.clone()));
            }
        }
        for index in &self.indexes {
            if let Some(missing) = index.columns.iter().find(|c| !seen.contains(c.as_str())) {
                return Err(ValidationError::UnknownIndexColumn {
                    index: index.name.clone(),
                    column: missing.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::column_sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {}({})",
            self.name,
            columns.join(", ")
        )
    }
}

/// Multiset equality: every element of `a` pairs with a distinct equal
/// element of `b`.
fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|item| {
        match b
            .iter()
            .enumerate()
            .position(|(i, candidate)| !used[i] && candidate == item)
        {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && same_members(&self.columns, &other.columns)
            && same_members(&self.indexes, &other.indexes)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema: {}", self.name)?;
        if !self.columns.is_empty() {
            f.write_str("\n-Columns:")?;
            for column in &self.columns {
                write!(f, "\n     -{column}")?;
            }
        }
        if !self.indexes.is_empty() {
            f.write_str("\n-Indexes:")?;
            for index in &self.indexes {
                write!(f, "\n     -{index}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn id() -> Column {
        Column::new("id", ColumnType::Text).required().primary_key()
    }

    pub fn user() -> Column {
        Column::new("user", ColumnType::Other("INT".to_string()))
    }

    pub fn created_at() -> Column {
        Column::new("created_at", ColumnType::Timestamp)
            .required()
            .with_default("CURRENT_TIMESTAMP")
    }

    pub fn fake() -> Column {
        Column::new("fake", ColumnType::Text)
    }

    pub fn base_schema(name: &str) -> Schema {
        Schema::new(
            name,
            vec![id(), user(), created_at()],
            vec![
                Index::new("id", ["id"]),
                Index::new("user", ["user"]),
                Index::new("created_at", ["created_at"]),
                Index::new("user_created_at", ["user", "created_at"]),
            ],
        )
    }
}
