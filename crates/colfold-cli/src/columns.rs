//! Loading column configurations from a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use colfold_core::{ConcatColumn, ConcatColumnSpec, ConfigError};

/// Read a JSON array of column specs.
///
/// Every entry must pass validation; the CLI has no list methods or info
/// parsers to fill gaps, so an incomplete entry is reported up front.
pub fn load_columns(path: &Path) -> Result<Vec<ConcatColumn>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read column file {:?}", path))?;
    parse_columns(&content).with_context(|| format!("Invalid column file {:?}", path))
}

pub fn parse_columns(content: &str) -> Result<Vec<ConcatColumn>> {
    let specs: Vec<ConcatColumnSpec> = serde_json::from_str(content)?;
    let columns: Vec<ConcatColumn> = specs.into_iter().map(ConcatColumn::from).collect();
    for column in &columns {
        column.validate_displayable()?;
    }
    Ok(columns)
}

/// Find a column by its target name.
pub fn find_column<'a>(columns: &'a [ConcatColumn], name: &str) -> Result<&'a ConcatColumn, ConfigError> {
    columns
        .iter()
        .find(|c| c.column_name() == name)
        .ok_or_else(|| ConfigError::UnknownColumn(name.to_string()))
}
