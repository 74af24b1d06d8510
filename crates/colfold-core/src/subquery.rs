//! Correlated sub-query rewrite for filtering on a concatenated column.
//!
//! A concatenated column cannot be filtered after materialization because
//! the match has to run against individual child rows, not the joined
//! string. Instead the child query is turned into a predicate for the
//! primary query's `WHERE` clause:
//!
//! ```text
//! "<parent>" IN ( SELECT "<join>" FROM ( <child query> WHERE "<filter>" LIKE $n ) AS colfold_filtered )
//! ```

use tracing::warn;

use crate::binding::{bind_parameters, quote_identifier, Bindings, Predicate};
use crate::column::ConcatColumn;
use crate::value::Value;

/// Alias given to the filtered child query.
pub const FILTERED_ALIAS: &str = "colfold_filtered";

/// Build the correlated sub-query predicate for `column`, matching `value`
/// with `LIKE` against the filter column (or the display column).
///
/// Exactly one parameter, `value`, is pushed into `bindings`, so the
/// fragment's placeholder continues the primary query's numbering. `value`
/// is bound as given; wrap it with wildcards first (see [`contains_pattern`])
/// for a substring match. Nothing is executed.
///
/// The outer side of the predicate is the parent column, the inner side the
/// join column; with the default join column both are the same name.
///
/// If the column has no filter or display column, or no parent column, the
/// child query is returned unmodified and nothing is bound: callers must read
/// that as "no additional filtering applied".
pub fn build_correlated_subquery(
    value: impl Into<Value>,
    column: &ConcatColumn,
    bindings: &mut Bindings,
) -> String {
    let query = column.spec.query.trim().trim_end_matches(';');
    let parent_column = column.parent_column_name();
    let join_column = column.join_column_name();

    let Some(filter_column) = column.filter_column_name() else {
        warn!(
            "Concat column '{}' has no filter or display column; sub-query left unfiltered",
            column.column_name()
        );
        return query.to_string();
    };
    if parent_column.trim().is_empty() {
        warn!(
            "Concat column '{}' has no parent column; sub-query left unfiltered",
            column.column_name()
        );
        return query.to_string();
    }

    let child = bind_parameters(query, &[Predicate::like(filter_column, value)], true, bindings);
    format!(
        "{parent} IN ( SELECT {join} FROM ( {child} ) AS {alias} )",
        parent = quote_identifier(parent_column),
        join = quote_identifier(join_column),
        child = child,
        alias = FILTERED_ALIAS
    )
}

/// Wrap `value` as a `LIKE` substring pattern, escaping `\`, `%` and `_`.
pub fn contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skus() -> ConcatColumn {
        ConcatColumn::new("OrderId", "Skus", "SELECT order_id AS \"OrderId\", sku AS \"Sku\" FROM order_lines")
            .filter_column("Sku")
            .display_column("Sku")
    }

    #[test]
    fn test_builds_correlated_predicate() {
        let mut b = Bindings::new();
        let sql = build_correlated_subquery("widget", &skus(), &mut b);
        assert_eq!(
            sql,
            "\"OrderId\" IN ( SELECT \"OrderId\" FROM ( SELECT * FROM (SELECT order_id AS \"OrderId\", sku AS \"Sku\" FROM order_lines) AS colfold_src WHERE \"Sku\" LIKE $1 ) AS colfold_filtered )"
        );
        assert_eq!(b.params(), &[Value::from("widget")]);
    }

    #[test]
    fn test_binds_exactly_one_parameter_after_existing_ones() {
        let mut b = Bindings::new();
        b.push(Value::from("open"));
        let sql = build_correlated_subquery(contains_pattern("widget"), &skus(), &mut b);
        assert!(sql.contains("LIKE $2"));
        assert_eq!(b.params(), &[Value::from("open"), Value::from("%widget%")]);
    }

    #[test]
    fn test_uses_join_column_when_set() {
        let mut b = Bindings::new();
        let column = skus().join_column("order_id");
        let sql = build_correlated_subquery("w", &column, &mut b);
        assert!(sql.starts_with("\"OrderId\" IN ( SELECT \"order_id\" FROM ("));
    }

    #[test]
    fn test_falls_back_to_display_column() {
        let mut b = Bindings::new();
        let column = ConcatColumn::new("OrderId", "Skus", "SELECT * FROM order_lines").display_column("Label");
        let sql = build_correlated_subquery("w", &column, &mut b);
        assert!(sql.contains("\"Label\" LIKE $1"));
    }

    #[test]
    fn test_missing_filter_column_returns_query_unmodified() {
        let mut b = Bindings::new();
        let column = ConcatColumn::new("OrderId", "Skus", "SELECT * FROM order_lines;");
        let sql = build_correlated_subquery("w", &column, &mut b);
        assert_eq!(sql, "SELECT * FROM order_lines");
        assert!(b.is_empty());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("widget"), "%widget%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
