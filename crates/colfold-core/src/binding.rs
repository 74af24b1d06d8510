//! Parameter binding for secondary-source queries.
//!
//! Values never appear in SQL text: every value is pushed into a
//! [`Bindings`] list and referenced by a Postgres-style `$n` placeholder.
//! Only identifiers are spliced into the text, double-quoted.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Alias given to a wrapped query template.
pub const SOURCE_ALIAS: &str = "colfold_src";

/// A parameterized statement ready for an executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlRequest {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlRequest {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Ordered parameter list that hands out placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    params: Vec<Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a value and return its placeholder.
    pub fn push(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateOp {
    In,
    Like,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Single(Value),
    List(Vec<Value>),
}

/// `{column, value, operator}` triple bound into a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: PredicateOp,
    pub value: PredicateValue,
}

impl Predicate {
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            op: PredicateOp::In,
            value: PredicateValue::List(values),
        }
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: PredicateOp::Like,
            value: PredicateValue::Single(pattern.into()),
        }
    }

    /// Render this predicate, pushing its values into `bindings`.
    pub fn to_sql(&self, bindings: &mut Bindings) -> String {
        let col = quote_identifier(&self.column);
        match (&self.op, &self.value) {
            (PredicateOp::In, PredicateValue::List(vals)) if vals.is_empty() => "FALSE".to_string(),
            (PredicateOp::In, PredicateValue::List(vals)) => {
                let list = vals
                    .iter()
                    .map(|v| bindings.push(v.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} IN ({})", col, list)
            }
            (PredicateOp::In, PredicateValue::Single(v)) => {
                format!("{} IN ({})", col, bindings.push(v.clone()))
            }
            (PredicateOp::Like, PredicateValue::Single(v)) => {
                format!("{} LIKE {}", col, bindings.push(v.clone()))
            }
            (PredicateOp::Like, PredicateValue::List(vals)) => {
                let parts = vals
                    .iter()
                    .map(|v| format!("{} LIKE {}", col, bindings.push(v.clone())))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                format!("({})", parts)
            }
        }
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_identifier(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Bind `predicates` onto a query template.
///
/// With `for_where`, the template is wrapped as a derived table and filtered:
/// `SELECT * FROM (<query>) AS colfold_src WHERE <p1> AND <p2>`. Without it,
/// only the joined predicate text is returned so the caller can splice it
/// into a clause of its own. Wrapping leaves the template untouched, so it may
/// carry its own `WHERE`, `GROUP BY` or `ORDER BY`.
pub fn bind_parameters(
    query: &str,
    predicates: &[Predicate],
    for_where: bool,
    bindings: &mut Bindings,
) -> String {
    let clause = predicates
        .iter()
        .map(|p| p.to_sql(bindings))
        .collect::<Vec<_>>()
        .join(" AND ");

    if !for_where {
        return clause;
    }
    let query = query.trim().trim_end_matches(';');
    if clause.is_empty() {
        return query.to_string();
    }
    format!("SELECT * FROM ({}) AS {} WHERE {}", query, SOURCE_ALIAS, clause)
}

/// Build one batch request: the template filtered by `join_column IN (keys)`.
pub fn bind_in_batch(query: &str, join_column: &str, keys: &[Value]) -> SqlRequest {
    let mut bindings = Bindings::new();
    let sql = bind_parameters(
        query,
        &[Predicate::in_list(join_column, keys.to_vec())],
        true,
        &mut bindings,
    );
    SqlRequest::new(sql, bindings.into_params())
}
