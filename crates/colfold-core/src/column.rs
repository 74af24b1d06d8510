//! Concatenated-column configuration and its injectable strategies.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ExecutionError};
use crate::table::Row;
use crate::value::Value;

/// Maps a secondary row to the string it contributes, if any.
pub trait InfoParser: Send + Sync {
    fn parse(&self, row: &Row) -> Option<String>;
}

impl<F> InfoParser for F
where
    F: Fn(&Row) -> Option<String> + Send + Sync,
{
    fn parse(&self, row: &Row) -> Option<String> {
        self(row)
    }
}

/// Default parser: render a single column of the secondary row.
#[derive(Debug, Clone)]
pub struct DisplayColumnParser {
    column: String,
}

impl DisplayColumnParser {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl InfoParser for DisplayColumnParser {
    fn parse(&self, row: &Row) -> Option<String> {
        row.get(&self.column).and_then(Value::render)
    }
}

/// Caller-supplied replacement for the default batched query.
///
/// Receives the full key list in one call; batching is the implementor's
/// concern.
#[async_trait]
pub trait ListMethod: Send + Sync {
    async fn list(&self, keys: &[Value]) -> Result<Vec<Row>, ExecutionError>;
}

/// Declarative part of a column configuration, as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcatColumnSpec {
    pub parent_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_column: Option<String>,
    pub column_name: String,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_column: Option<String>,
}

/// One relationship to enrich: how to find a parent's children and how to
/// render them into a single column.
#[derive(Clone)]
pub struct ConcatColumn {
    pub spec: ConcatColumnSpec,
    pub list_method: Option<Arc<dyn ListMethod>>,
    pub info_parser: Option<Arc<dyn InfoParser>>,
}

impl fmt::Debug for ConcatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcatColumn")
            .field("spec", &self.spec)
            .field("list_method", &self.list_method.is_some())
            .field("info_parser", &self.info_parser.is_some())
            .finish()
    }
}

impl From<ConcatColumnSpec> for ConcatColumn {
    fn from(spec: ConcatColumnSpec) -> Self {
        Self {
            spec,
            list_method: None,
            info_parser: None,
        }
    }
}

impl ConcatColumn {
    pub fn new(
        parent_column: impl Into<String>,
        column_name: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        ConcatColumnSpec {
            parent_column: parent_column.into(),
            column_name: column_name.into(),
            query: query.into(),
            ..Default::default()
        }
        .into()
    }

    pub fn join_column(mut self, column: impl Into<String>) -> Self {
        self.spec.join_column = Some(column.into());
        self
    }

    pub fn display_column(mut self, column: impl Into<String>) -> Self {
        self.spec.display_column = Some(column.into());
        self
    }

    pub fn filter_column(mut self, column: impl Into<String>) -> Self {
        self.spec.filter_column = Some(column.into());
        self
    }

    pub fn list_method(mut self, method: Arc<dyn ListMethod>) -> Self {
        self.list_method = Some(method);
        self
    }

    pub fn info_parser(mut self, parser: Arc<dyn InfoParser>) -> Self {
        self.info_parser = Some(parser);
        self
    }

    pub fn parent_column_name(&self) -> &str {
        &self.spec.parent_column
    }

    pub fn column_name(&self) -> &str {
        &self.spec.column_name
    }

    /// Join column on the secondary rows; falls back to the parent column.
    pub fn join_column_name(&self) -> &str {
        non_empty(self.spec.join_column.as_deref()).unwrap_or(&self.spec.parent_column)
    }

    pub fn display_column_name(&self) -> Option<&str> {
        non_empty(self.spec.display_column.as_deref())
    }

    /// Column matched by the sub-query filter; falls back to the display column.
    pub fn filter_column_name(&self) -> Option<&str> {
        non_empty(self.spec.filter_column.as_deref()).or_else(|| self.display_column_name())
    }

    /// Render a secondary row through the info parser, or the display column.
    pub fn contribution(&self, row: &Row) -> Option<String> {
        match (&self.info_parser, self.display_column_name()) {
            (Some(parser), _) => parser.parse(row),
            (None, Some(column)) => row.get(column).and_then(Value::render),
            (None, None) => None,
        }
    }

    /// Check the configuration carries everything enrichment needs.
    ///
    /// A missing display column is not an error here: every child then
    /// contributes nothing and each keyed parent gets `""`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spec.parent_column.trim().is_empty() {
            return Err(ConfigError::MissingParentColumn);
        }
        if self.spec.column_name.trim().is_empty() {
            return Err(ConfigError::MissingColumnName(self.spec.parent_column.clone()));
        }
        if self.list_method.is_none() && self.spec.query.trim().is_empty() {
            return Err(ConfigError::MissingQuery(self.spec.column_name.clone()));
        }
        Ok(())
    }

    /// [`validate`](Self::validate), and also require something to display.
    pub fn validate_displayable(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.info_parser.is_none() && self.display_column_name().is_none() {
            return Err(ConfigError::MissingDisplay(self.spec.column_name.clone()));
        }
        Ok(())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
