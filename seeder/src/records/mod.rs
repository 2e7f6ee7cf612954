//! Insert statement generation and execution.
//!
//! One seed file becomes one multi-row statement:
//!
//! ```sql
//! INSERT INTO Publisher_companies (ID,NAME)
//! VALUES ('1','Acme'),('2','Globex')
//! ON CONFLICT DO NOTHING
//! ```
//!
//! Rows colliding with an existing key are skipped by the database, which
//! makes re-running a load over already seeded tables safe. Values are sent
//! as string literals with embedded quotes doubled; identifiers are embedded
//! unquoted and must therefore be plain SQL identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::db::SqlClient;
use crate::error::{RecordError, StatementError};
use crate::parser::Table;
use crate::resolve::ResolvedEntity;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid identifier pattern"));

/// A conflict-skipping bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl InsertStatement {
    /// Build a statement, checking every identifier.
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, StatementError> {
        let table = table.into();
        if columns.is_empty() {
            return Err(StatementError::NoColumns);
        }
        for name in std::iter::once(&table).chain(columns.iter()) {
            check_identifier(name)?;
        }
        Ok(Self { table, columns, rows })
    }

    /// Render the statement as SQL text.
    pub fn to_sql(&self) -> String {
        let values = self
            .rows
            .iter()
            .map(|row| {
                let literals: Vec<String> = row.iter().map(|v| quote_literal(v)).collect();
                format!("({})", literals.join(","))
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "INSERT INTO {} ({}) VALUES {} ON CONFLICT DO NOTHING",
            self.table,
            self.columns.join(","),
            values
        )
    }
}

/// Quote a value as an SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn check_identifier(name: &str) -> Result<(), StatementError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(StatementError::InvalidIdentifier(name.to_string()))
    }
}

/// Build the insert for a resolved entity; `None` when the table has no rows.
pub fn build_insert(
    entity: &ResolvedEntity<'_>,
    table: &Table,
) -> Result<Option<InsertStatement>, StatementError> {
    if table.is_empty() {
        return Ok(None);
    }
    InsertStatement::new(entity.table_name(), table.headers.clone(), table.rows.clone()).map(Some)
}

/// Why a file produced no statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// No entity matches the file name.
    Unresolved,
    /// The entity is flagged `@cds.persistence.skip`.
    PersistenceSkip,
    /// Pass-through view over an unknown source (strict views only).
    UnknownViewSource,
    /// Header only.
    NoRows,
}

/// Result of loading one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Loaded { table: String, rows: usize, rows_affected: u64 },
    Skipped(SkipReason),
}

/// Insert a table's rows into the entity's database table.
///
/// The statement is awaited before returning; a database error is returned
/// as is, nothing is retried.
pub async fn load_records<C: SqlClient + ?Sized>(
    entity: &ResolvedEntity<'_>,
    table: &Table,
    client: &C,
) -> Result<RecordOutcome, RecordError> {
    if entity.persistence_skip() {
        return Ok(RecordOutcome::Skipped(SkipReason::PersistenceSkip));
    }

    let Some(statement) = build_insert(entity, table)? else {
        return Ok(RecordOutcome::Skipped(SkipReason::NoRows));
    };

    let sql = statement.to_sql();
    let rows_affected = client
        .execute(&sql)
        .await
        .map_err(|source| RecordError::Database {
            table: statement.table.clone(),
            source,
        })?;

    Ok(RecordOutcome::Loaded {
        table: statement.table,
        rows: table.row_count(),
        rows_affected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ClientError, DryRunClient};
    use crate::model::{EntityDef, JsonModel};
    use crate::resolve::resolve_entity;
    use futures::future::BoxFuture;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn publisher_model() -> JsonModel {
        JsonModel::new()
            .with_entity("Publisher.companies", EntityDef::named("Publisher.companies"))
            .with_entity(
                "Publisher.drafts",
                EntityDef::named("Publisher.drafts").with_persistence_skip(true),
            )
    }

    fn companies() -> Table {
        Table::new(
            vec!["ID".into(), "NAME".into()],
            vec![vec!["1".into(), "Acme".into()]],
        )
    }

    /// Keeps one row per (table, first column) and skips colliding rows.
    #[derive(Default)]
    struct KeyedStore {
        keys: Mutex<HashMap<String, HashSet<String>>>,
        statements: Mutex<Vec<String>>,
    }

    impl KeyedStore {
        fn insert(&self, table: &str, key: &str) -> bool {
            self.keys
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .insert(key.to_string())
        }
    }

    impl SqlClient for KeyedStore {
        fn execute<'a>(&'a self, statement: &'a str) -> BoxFuture<'a, Result<u64, ClientError>> {
            Box::pin(async move {
                self.statements.lock().unwrap().push(statement.to_string());
                let table = statement
                    .trim_start_matches("INSERT INTO ")
                    .split(' ')
                    .next()
                    .unwrap_or_default();
                let values = statement
                    .split(" VALUES ")
                    .nth(1)
                    .and_then(|rest| rest.split(" ON CONFLICT").next())
                    .unwrap_or_default();
                let mut inserted: u64 = 0;
                for row in values.split("),(") {
                    let key = row.trim_matches(|c: char| c == '(' || c == ')').split(',').next();
                    if let Some(key) = key {
                        if self.insert(table, key) {
                            inserted += 1;
                        }
                    }
                }
                Ok::<u64, ClientError>(inserted)
            })
        }
    }

    struct FailingClient;

    impl SqlClient for FailingClient {
        fn execute<'a>(&'a self, _statement: &'a str) -> BoxFuture<'a, Result<u64, ClientError>> {
            Box::pin(async { Err::<u64, ClientError>("column \"NAME\" does not exist".into()) })
        }
    }

    #[test]
    fn test_statement_sql() {
        let model = publisher_model();
        let entity = resolve_entity(&model, "Publisher.companies").unwrap();
        let statement = build_insert(&entity, &companies()).unwrap().unwrap();

        assert_eq!(statement.table, "Publisher_companies");
        assert_eq!(
            statement.to_sql(),
            "INSERT INTO Publisher_companies (ID,NAME) VALUES ('1','Acme') ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn test_multiple_rows() {
        let statement = InsertStatement::new(
            "Books",
            vec!["ID".into(), "title".into()],
            vec![
                vec!["201".into(), "Wuthering Heights".into()],
                vec!["207".into(), "Jane Eyre".into()],
            ],
        )
        .unwrap();

        assert!(statement
            .to_sql()
            .contains("VALUES ('201','Wuthering Heights'),('207','Jane Eyre') ON CONFLICT"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal("'); DROP TABLE Books; --"), "'''); DROP TABLE Books; --'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_invalid_identifiers_rejected() {
        let bad_column = InsertStatement::new("Books", vec!["ID); DROP".into()], vec![]);
        assert!(matches!(bad_column, Err(StatementError::InvalidIdentifier(c)) if c == "ID); DROP"));

        let bad_table = InsertStatement::new("my-table", vec!["ID".into()], vec![]);
        assert!(matches!(bad_table, Err(StatementError::InvalidIdentifier(_))));

        let no_columns = InsertStatement::new("Books", vec![], vec![]);
        assert!(matches!(no_columns, Err(StatementError::NoColumns)));
    }

    #[test]
    fn test_empty_table_builds_nothing() {
        let model = publisher_model();
        let entity = resolve_entity(&model, "Publisher.companies").unwrap();
        let header_only = Table::new(vec!["ID".into()], vec![]);

        assert_eq!(build_insert(&entity, &header_only).unwrap(), None);
    }

    #[tokio::test]
    async fn test_persistence_skip_never_executes() {
        let model = publisher_model();
        let entity = resolve_entity(&model, "Publisher.drafts").unwrap();
        let client = DryRunClient::new();

        let outcome = load_records(&entity, &companies(), &client).await.unwrap();

        assert_eq!(outcome, RecordOutcome::Skipped(SkipReason::PersistenceSkip));
        assert!(client.statements().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_skips_existing_rows() {
        let model = publisher_model();
        let entity = resolve_entity(&model, "Publisher.companies").unwrap();
        let store = KeyedStore::default();

        let first = load_records(&entity, &companies(), &store).await.unwrap();
        let second = load_records(&entity, &companies(), &store).await.unwrap();

        assert_eq!(
            first,
            RecordOutcome::Loaded { table: "Publisher_companies".into(), rows: 1, rows_affected: 1 }
        );
        assert_eq!(
            second,
            RecordOutcome::Loaded { table: "Publisher_companies".into(), rows: 1, rows_affected: 0 }
        );
        let statements = store.statements.lock().unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s.ends_with("ON CONFLICT DO NOTHING")));
    }

    #[tokio::test]
    async fn test_database_error_propagates() {
        let model = publisher_model();
        let entity = resolve_entity(&model, "Publisher.companies").unwrap();

        let err = load_records(&entity, &companies(), &FailingClient).await.unwrap_err();
        match err {
            RecordError::Database { table, source } => {
                assert_eq!(table, "Publisher_companies");
                assert!(source.to_string().contains("does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
