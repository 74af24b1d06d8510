//! colfold core - concatenated-column enrichment
//!
//! This crate augments a primary result set with aggregated values pulled
//! from related tables:
//! - batched, parameter-safe fetching of child rows by parent key
//! - correlation and `", "`-joined aggregation back onto parent rows
//! - correlated sub-query rewrite for filtering on an aggregated column

pub mod batch;
pub mod binding;
pub mod column;
pub mod engine;
pub mod error;
pub mod executor;
pub mod subquery;
pub mod table;
pub mod value;

pub use batch::DEFAULT_MAX_BATCH_SIZE;
pub use binding::{bind_parameters, Bindings, Predicate, PredicateOp, SqlRequest};
pub use column::{ConcatColumn, ConcatColumnSpec, DisplayColumnParser, InfoParser, ListMethod};
pub use engine::{aggregate_into, ConcatEnricher, EnrichOptions};
pub use error::{ConfigError, ExecutionError};
pub use executor::QueryExecutor;
pub use subquery::{build_correlated_subquery, contains_pattern};
pub use table::{Row, Table};
pub use value::Value;
