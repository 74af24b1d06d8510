//! `QueryExecutor` backed by a sqlx Postgres pool.

use std::time::Duration;

use async_trait::async_trait;
use colfold_core::{ExecutionError, QueryExecutor, Row, SqlRequest, Value};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::Postgres;
use tracing::{debug, info};

use crate::row::pg_row_to_row;

/// Executes bound requests against PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl PgExecutor {
    /// Connect a new pool to `conn_string`.
    pub async fn connect(conn_string: &str, max_connections: u32) -> Result<Self, ExecutionError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(conn_string)
            .await
            .map_err(map_sqlx_error)?;
        info!(
            "Connected to {} (max_connections={})",
            redact_conn_string(conn_string),
            max_connections
        );
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    /// Fail any single statement that runs longer than `timeout`.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch(&self, request: &SqlRequest) -> Result<Vec<PgRow>, ExecutionError> {
        let query = request
            .params
            .iter()
            .fold(sqlx::query(&request.sql), bind_value);
        let fut = query.fetch_all(&self.pool);
        let result = match self.statement_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ExecutionError::Timeout(limit))?,
            None => fut.await,
        };
        result.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn query(&self, request: &SqlRequest) -> Result<Vec<Row>, ExecutionError> {
        debug!("PgExecutor query ({} params): {}", request.params.len(), request.sql);
        let rows = self.fetch(request).await?;
        Ok(rows.iter().map(pg_row_to_row).collect())
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
    }
}

/// Classify a sqlx error: pool and transport failures are connection
/// failures, everything else is a query failure.
pub fn map_sqlx_error(e: sqlx::Error) -> ExecutionError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => ExecutionError::ConnectionFailed(e.to_string()),
        other => ExecutionError::QueryFailed(other.to_string()),
    }
}

/// Render a connection string with its password replaced, for logging.
pub fn redact_conn_string(conn_string: &str) -> String {
    match url::Url::parse(conn_string) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable connection string>".to_string(),
    }
}
