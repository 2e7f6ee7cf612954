//! Database client seam.
//!
//! The loader hands one textual statement per seed file to a [`SqlClient`]
//! and awaits it before moving on. Connection lifecycle, pooling and
//! transactions stay with the caller.

use futures::future::BoxFuture;
use std::sync::Mutex;

/// Error returned by a client; carried unchanged into [`crate::LoadError::Database`].
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Executes statements produced by the loader.
pub trait SqlClient: Send + Sync {
    /// Execute `statement`, returning the number of affected rows.
    fn execute<'a>(&'a self, statement: &'a str) -> BoxFuture<'a, Result<u64, ClientError>>;
}

impl<C: SqlClient + ?Sized> SqlClient for &C {
    fn execute<'a>(&'a self, statement: &'a str) -> BoxFuture<'a, Result<u64, ClientError>> {
        (**self).execute(statement)
    }
}

impl SqlClient for sqlx::PgPool {
    fn execute<'a>(&'a self, statement: &'a str) -> BoxFuture<'a, Result<u64, ClientError>> {
        Box::pin(async move {
            let result = sqlx::query(statement).execute(self).await?;
            Ok::<u64, ClientError>(result.rows_affected())
        })
    }
}

/// Records statements instead of executing them.
#[derive(Debug, Default)]
pub struct DryRunClient {
    statements: Mutex<Vec<String>>,
}

impl DryRunClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements received so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl SqlClient for DryRunClient {
    fn execute<'a>(&'a self, statement: &'a str) -> BoxFuture<'a, Result<u64, ClientError>> {
        Box::pin(async move {
            self.statements
                .lock()
                .map_err(|e| e.to_string())?
                .push(statement.to_string());
            Ok::<u64, ClientError>(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_records_in_order() {
        let client = DryRunClient::new();
        client.execute("INSERT INTO a (x) VALUES ('1')").await.unwrap();
        client.execute("INSERT INTO b (y) VALUES ('2')").await.unwrap();

        let statements = client.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("INSERT INTO a"));
        assert!(statements[1].contains("INSERT INTO b"));
    }

    #[tokio::test]
    async fn test_client_by_reference() {
        let client = DryRunClient::new();
        let by_ref: &dyn SqlClient = &client;
        assert_eq!(by_ref.execute("SELECT 1").await.unwrap(), 0);
        assert_eq!(client.statements(), vec!["SELECT 1"]);
    }
}
