//! Schema diffing and migration planning.
//!
//! `plan(current, desired)` produces the ordered statements that take the
//! live table FROM `current` TO `desired`. Index-only changes are applied in
//! place; any column change (or a rename) rebuilds the table through a
//! temporary copy so retained columns keep their data.

use vectable_types::schema::{Column, Index, Schema};

/// Suffix appended to the current table name while it is being rebuilt.
pub const TEMP_TABLE_SUFFIX: &str = "_tmp";

/// Structural difference between two schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiff {
    pub add_columns: Vec<Column>,
    pub remove_columns: Vec<Column>,
    pub add_indexes: Vec<Index>,
    pub remove_indexes: Vec<Index>,
}

impl SchemaDiff {
    pub fn has_column_changes(&self) -> bool {
        !self.add_columns.is_empty() || !self.remove_columns.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_column_changes() && self.add_indexes.is_empty() && self.remove_indexes.is_empty()
    }
}

fn missing_from<T: PartialEq + Clone>(items: &[T], other: &[T]) -> Vec<T> {
    items
        .iter()
        .filter(|item| !other.contains(item))
        .cloned()
        .collect()
}

/// Columns and indexes to add and remove to go from `current` to `desired`.
pub fn diff(current: &Schema, desired: &Schema) -> SchemaDiff {
    SchemaDiff {
        add_columns: missing_from(&desired.columns, &current.columns),
        remove_columns: missing_from(&current.columns, &desired.columns),
        add_indexes: missing_from(&desired.indexes, &current.indexes),
        remove_indexes: missing_from(&current.indexes, &desired.indexes),
    }
}

pub fn temp_table_name(table: &str) -> String {
    format!("{table}{TEMP_TABLE_SUFFIX}")
}

/// Statements that create `schema` from nothing.
pub fn create_plan(schema: &Schema) -> Vec<String> {
    let mut statements = Vec::with_capacity(1 + schema.indexes.len());
    statements.push(schema.create_table_sql());
    statements.extend(
        schema
            .indexes
            .iter()
            .map(|index| index.create_index_sql(&schema.name)),
    );
    statements
}

/// `INSERT INTO <to>(cols) SELECT cols FROM <from>`.
pub fn copy_rows_sql(to: &str, from: &str, columns: &[&str]) -> String {
    let list = columns.join(", ");
    format!("INSERT INTO {to}({list}) SELECT {list} FROM {from}")
}

/// Ordered statements that migrate `current` to `desired`.
///
/// Returns an empty plan when the schemas are already equal.
pub fn plan(current: &Schema, desired: &Schema) -> Vec<String> {
    let delta = diff(current, desired);
    let rebuild = delta.has_column_changes() || current.name != desired.name;

    if !rebuild {
        let mut statements: Vec<String> = delta
            .remove_indexes
            .iter()
            .map(|index| index.drop_index_sql(&current.name))
            .collect();
        statements.extend(
            delta
                .add_indexes
                .iter()
                .map(|index| index.create_index_sql(&desired.name)),
        );
        return statements;
    }

    // Indexes cannot be renamed and stay attached to the renamed table, so
    // every existing index goes regardless of whether it changed.
    let mut statements: Vec<String> = current
        .indexes
        .iter()
        .map(|index| index.drop_index_sql(&current.name))
        .collect();

    let temp = temp_table_name(&current.name);
    statements.push(format!("ALTER TABLE {} RENAME TO {temp}", current.name));
    statements.extend(create_plan(desired));

    let kept: Vec<&str> = current
        .columns
        .iter()
        .filter(|column| desired.columns.contains(column))
        .map(|column| column.name.as_str())
        .collect();
    if !kept.is_empty() {
        statements.push(copy_rows_sql(&desired.name, &temp, &kept));
    }

    statements.push(format!("DROP TABLE IF EXISTS {temp}"));
    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use vectable_types::schema::ColumnType;

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

    fn base() -> Schema {
        Schema::new(
            "base",
            vec![id(), user(), created_at()],
            vec![
                Index::new("id", ["id"]),
                Index::new("user", ["user"]),
                Index::new("created_at", ["created_at"]),
                Index::new("user_created_at", ["user", "created_at"]),
            ],
        )
    }

    #[test]
    fn test_diff_reports_each_direction() {
        let base = Schema::new(
            "base",
            vec![id(), user(), created_at()],
            vec![
                Index::new("id", ["id"]),
                Index::new("user", ["user"]),
                Index::new("created_at", ["created_at"]),
            ],
        );
        let other = Schema::new(
            "other",
            vec![id(), user(), fake()],
            vec![
                Index::new("id", ["id"]),
                Index::new("user", ["user"]),
                Index::new("user_created_at", ["user", "created_at"]),
            ],
        );

        let delta = diff(&base, &other);
        assert_eq!(delta.add_columns, vec![fake()]);
        assert_eq!(delta.remove_columns, vec![created_at()]);
        assert_eq!(delta.add_indexes, vec![Index::new("user_created_at", ["user", "created_at"])]);
        assert_eq!(delta.remove_indexes, vec![Index::new("created_at", ["created_at"])]);
    }

    #[test]
    fn test_diff_of_equal_schemas_is_empty() {
        let delta = diff(&base(), &base());
        assert!(delta.is_empty());
        assert!(plan(&base(), &base()).is_empty());
    }

    #[test]
    fn test_diff_treats_changed_flags_as_replace() {
        let mut desired = base();
        desired.columns[1].required = true;
        let delta = diff(&base(), &desired);
        assert_eq!(delta.add_columns.len(), 1);
        assert_eq!(delta.remove_columns.len(), 1);
    }

    #[test]
    fn test_index_only_plan_has_no_rename() {
        let mut desired = base();
        desired.indexes.truncate(3);
        desired.indexes.push(Index::new("new_index", ["user"]));

        let statements = plan(&base(), &desired);
        assert_eq!(
            statements,
            vec![
                "DROP INDEX IF EXISTS base_user_created_at",
                "CREATE INDEX IF NOT EXISTS base_new_index ON base(user)",
            ]
        );
        assert!(statements.iter().all(|s| !s.contains("RENAME")));
    }

    #[test]
    fn test_index_rename_drops_and_creates() {
        let mut desired = base();
        desired.indexes[0].name = "new_name".to_string();
        let statements = plan(&base(), &desired);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "DROP INDEX IF EXISTS base_id");
        assert_eq!(statements[1], "CREATE INDEX IF NOT EXISTS base_new_name ON base(id)");
    }

    #[test]
    fn test_rebuild_plan_order() {
        let mut desired = base();
        desired.columns.truncate(2);
        desired.columns.push(fake());
        desired.indexes.truncate(2);
        desired.indexes.push(Index::new("new_index", ["user"]));

        let statements = plan(&base(), &desired);
        assert_eq!(
            statements,
            vec![
                "DROP INDEX IF EXISTS base_id",
                "DROP INDEX IF EXISTS base_user",
                "DROP INDEX IF EXISTS base_created_at",
                "DROP INDEX IF EXISTS base_user_created_at",
                "ALTER TABLE base RENAME TO base_tmp",
                "CREATE TABLE IF NOT EXISTS base(id TEXT NOT NULL PRIMARY KEY, user INT, fake TEXT)",
                "CREATE INDEX IF NOT EXISTS base_id ON base(id)",
                "CREATE INDEX IF NOT EXISTS base_user ON base(user)",
                "CREATE INDEX IF NOT EXISTS base_new_index ON base(user)",
                "INSERT INTO base(id, user) SELECT id, user FROM base_tmp",
                "DROP TABLE IF EXISTS base_tmp",
            ]
        );
    }

    #[test]
    fn test_rename_forces_rebuild() {
        let mut desired = base();
        desired.name = "renamed".to_string();
        let statements = plan(&base(), &desired);
        assert!(statements.contains(&"ALTER TABLE base RENAME TO base_tmp".to_string()));
        assert!(statements.contains(
            &"INSERT INTO renamed(id, user, created_at) SELECT id, user, created_at FROM base_tmp"
                .to_string()
        ));
        assert_eq!(statements.last().unwrap(), "DROP TABLE IF EXISTS base_tmp");
    }

    #[test]
    fn test_rebuild_without_shared_columns_skips_copy() {
        let desired = Schema::new("base", vec![fake()], vec![]);
        let statements = plan(&base(), &desired);
        assert!(statements.iter().all(|s| !s.starts_with("INSERT")));
        assert_eq!(statements.last().unwrap(), "DROP TABLE IF EXISTS base_tmp");
    }

    #[test]
    fn test_create_plan() {
        let statements = create_plan(&base());
        assert_eq!(statements.len(), 5);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS base("));
        assert!(statements[1..].iter().all(|s| s.starts_with("CREATE INDEX")));
    }
}
