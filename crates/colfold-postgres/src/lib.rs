//! colfold Postgres - query executor for the enrichment engine
//!
//! Runs bound requests through a sqlx connection pool and converts the
//! resulting `PgRow`s into core rows.

pub mod executor;
pub mod row;

pub use executor::{map_sqlx_error, redact_conn_string, PgExecutor};
pub use row::{pg_row_to_row, pg_type_kind, ValueKind};
