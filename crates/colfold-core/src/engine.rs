//! Concatenated-column enrichment engine.
//!
//! For each [`ConcatColumn`], the engine collects the parent keys of a
//! [`Table`], fetches the related secondary rows in parameter-safe batches
//! (or through the column's list method), and folds each parent's children
//! into a single `", "`-joined string written back onto the parent row.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::batch::{compute_batch_ranges, dedup_keys, extract_keys, DEFAULT_MAX_BATCH_SIZE};
use crate::binding::bind_in_batch;
use crate::column::ConcatColumn;
use crate::error::ExecutionError;
use crate::executor::QueryExecutor;
use crate::table::{Row, Table};
use crate::value::{KeyRepr, Value};

/// Separator placed between contributions of one parent.
pub const CONCAT_SEPARATOR: &str = ", ";

/// Engine settings, fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Maximum number of keys bound into one statement.
    pub max_batch_size: usize,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Enriches tables with concatenated child values fetched through `E`.
pub struct ConcatEnricher<E> {
    executor: E,
    options: EnrichOptions,
}

impl<E: QueryExecutor> ConcatEnricher<E> {
    pub fn new(executor: E) -> Self {
        Self::with_options(executor, EnrichOptions::default())
    }

    pub fn with_options(executor: E, options: EnrichOptions) -> Self {
        Self { executor, options }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn options(&self) -> EnrichOptions {
        self.options
    }

    /// Enrich `table` in place with every column in `columns`, in order.
    ///
    /// The table is mutated and also handed back. Each configuration adds (or
    /// overwrites) one field per parent row with a non-null key; rows are never
    /// added or removed. Invalid configurations are logged and skipped.
    ///
    /// An executor or list-method failure aborts the call and is returned
    /// unchanged. Columns written before the failure keep their values.
    pub async fn enrich<'t>(
        &self,
        table: &'t mut Table,
        columns: &[ConcatColumn],
    ) -> Result<&'t mut Table, ExecutionError> {
        if table.is_empty() || columns.is_empty() {
            return Ok(table);
        }

        for column in columns {
            if let Err(e) = column.validate() {
                warn!("Skipping concat column: {}", e);
                continue;
            }

            let keys = extract_keys(table.rows(), column.parent_column_name());
            table.add_column(column.column_name());

            if keys.is_empty() {
                debug!(
                    "No non-null '{}' keys for concat column '{}'",
                    column.parent_column_name(),
                    column.column_name()
                );
                continue;
            }

            let children = self.fetch_children(column, &keys).await?;
            let written = aggregate_into(table, column, &children);

            info!(
                "Concat column '{}': keys={}, children={}, rows_written={}",
                column.column_name(),
                keys.len(),
                children.len(),
                written
            );
        }

        Ok(table)
    }

    /// Fetch the secondary rows for `keys`.
    ///
    /// A configured list method receives the full key list in one call.
    /// Otherwise the distinct keys are split into batches of at most
    /// `max_batch_size`, queried one after another, and the batch results are
    /// concatenated in batch order.
    pub async fn fetch_children(
        &self,
        column: &ConcatColumn,
        keys: &[Value],
    ) -> Result<Vec<Row>, ExecutionError> {
        if let Some(method) = &column.list_method {
            debug!(
                "Concat column '{}': list method with {} keys",
                column.column_name(),
                keys.len()
            );
            return method.list(keys).await;
        }

        let fetch_keys = dedup_keys(keys);
        let ranges = compute_batch_ranges(fetch_keys.len(), self.options.max_batch_size);
        let join_column = column.join_column_name();

        let mut merged: Vec<Row> = Vec::new();
        for (i, range) in ranges.iter().enumerate() {
            let request = bind_in_batch(&column.spec.query, join_column, &fetch_keys[range.clone()]);
            debug!(
                "Concat column '{}': batch {}/{} ({} keys): {}",
                column.column_name(),
                i + 1,
                ranges.len(),
                range.len(),
                request.sql
            );
            let rows = self.executor.query(&request).await?;
            merged.extend(rows);
        }
        Ok(merged)
    }
}

/// Correlate `children` with the parent rows of `table` and write each
/// parent's joined contributions into the column's target field.
///
/// Children keep their assembly order within a parent. `None` and empty
/// contributions are dropped; a parent with no surviving contribution gets
/// `""`. Parents with a null or absent key are left untouched. Returns the
/// number of rows written.
pub fn aggregate_into(table: &mut Table, column: &ConcatColumn, children: &[Row]) -> usize {
    let join_column = column.join_column_name();
    let mut groups: HashMap<KeyRepr, Vec<&Row>> = HashMap::new();
    for child in children {
        if let Some(key) = child.get(join_column).and_then(Value::key) {
            groups.entry(key).or_default().push(child);
        }
    }

    let parent_column = column.parent_column_name();
    let target = column.column_name();
    let mut written = 0;
    for row in table.rows_mut() {
        let Some(key) = row.get(parent_column).and_then(Value::key) else {
            continue;
        };
        let joined = groups
            .get(&key)
            .map(|group| {
                group
                    .iter()
                    .filter_map(|child| column.contribution(child))
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(CONCAT_SEPARATOR)
            })
            .unwrap_or_default();
        row.set(target, joined);
        written += 1;
    }
    written
}
