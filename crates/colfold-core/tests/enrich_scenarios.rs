//! End-to-end enrichment scenarios against an in-memory executor.

use std::sync::Mutex;

use async_trait::async_trait;
use colfold_core::{
    build_correlated_subquery, Bindings, ConcatColumn, ConcatEnricher, EnrichOptions, ExecutionError,
    QueryExecutor, Row, SqlRequest, Table, Value,
};

/// Child table held in memory. Answers each batch with the rows whose join
/// value is among the bound parameters, in storage order.
struct MemoryExecutor {
    join_column: &'static str,
    rows: Vec<Row>,
    batches: Mutex<Vec<Vec<Value>>>,
}

impl MemoryExecutor {
    fn new(join_column: &'static str, rows: Vec<Row>) -> Self {
        Self {
            join_column,
            rows,
            batches: Mutex::new(vec![]),
        }
    }

    fn batches(&self) -> Vec<Vec<Value>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn query(&self, request: &SqlRequest) -> Result<Vec<Row>, ExecutionError> {
        self.batches.lock().unwrap().push(request.params.clone());
        let wanted: Vec<_> = request.params.iter().filter_map(Value::key).collect();
        Ok(self
            .rows
            .iter()
            .filter(|r| {
                r.get(self.join_column)
                    .and_then(Value::key)
                    .is_some_and(|k| wanted.contains(&k))
            })
            .cloned()
            .collect())
    }
}

fn order_lines(orders: i64) -> Vec<Row> {
    (0..orders)
        .flat_map(|order| {
            vec![
                Row::new().with("order_id", order).with("sku", format!("A-{}", order)),
                Row::new().with("order_id", order).with("sku", format!("B-{}", order)),
            ]
        })
        .collect()
}

fn lines_column() -> ConcatColumn {
    ConcatColumn::new("id", "skus", "SELECT order_id, sku FROM order_lines")
        .join_column("order_id")
        .display_column("sku")
}

#[tokio::test]
async fn large_key_set_is_split_at_default_ceiling() {
    let executor = MemoryExecutor::new("order_id", order_lines(4000));
    let enricher = ConcatEnricher::new(&executor);
    let mut table = Table::from_rows((0..4000i64).map(|id| Row::new().with("id", id)).collect());

    enricher.enrich(&mut table, &[lines_column()]).await.unwrap();

    let batches = executor.batches();
    assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![1500, 1500, 1000]);
    let flattened: Vec<Value> = batches.into_iter().flatten().collect();
    assert_eq!(flattened, (0..4000i64).map(Value::Int).collect::<Vec<_>>());

    for (id, row) in table.rows().iter().enumerate() {
        assert_eq!(row.get("skus"), Some(&Value::from(format!("A-{id}, B-{id}"))));
    }
}

#[tokio::test]
async fn merged_children_follow_batch_order() {
    let executor = MemoryExecutor::new("order_id", order_lines(5));
    let enricher = ConcatEnricher::with_options(&executor, EnrichOptions { max_batch_size: 2 });
    let column = lines_column();
    let keys: Vec<Value> = (0..5i64).map(Value::Int).collect();

    let children = enricher.fetch_children(&column, &keys).await.unwrap();

    assert_eq!(executor.batches().len(), 3);
    assert_eq!(children, order_lines(5));
}

#[tokio::test]
async fn repeated_enrichment_is_stable() {
    let executor = MemoryExecutor::new("order_id", order_lines(3));
    let enricher = ConcatEnricher::new(&executor);
    let mut table = Table::from_rows((0..3i64).map(|id| Row::new().with("id", id)).collect());

    enricher.enrich(&mut table, &[lines_column()]).await.unwrap();
    let first = table.clone();
    enricher.enrich(&mut table, &[lines_column()]).await.unwrap();

    assert_eq!(table, first);
    assert_eq!(table.columns(), &["id".to_string(), "skus".to_string()]);
}

#[tokio::test]
async fn parent_without_children_gets_empty_string() {
    let executor = MemoryExecutor::new("order_id", order_lines(1));
    let enricher = ConcatEnricher::new(&executor);
    let mut table = Table::from_rows(vec![
        Row::new().with("id", 0),
        Row::new().with("id", 99),
        Row::new().with("id", Value::Null).with("skus", "kept"),
    ]);

    enricher.enrich(&mut table, &[lines_column()]).await.unwrap();

    let rows = table.rows();
    assert_eq!(rows[0].get("skus"), Some(&Value::from("A-0, B-0")));
    assert_eq!(rows[1].get("skus"), Some(&Value::from("")));
    assert_eq!(rows[2].get("skus"), Some(&Value::from("kept")));
}

#[tokio::test]
async fn several_columns_are_processed_in_order() {
    let executor = MemoryExecutor::new("order_id", order_lines(2));
    let enricher = ConcatEnricher::new(&executor);
    let mut table = Table::from_rows(vec![Row::new().with("id", 1)]);
    let upper = lines_column();
    let lower = ConcatColumn::new("id", "first_sku", "SELECT order_id, sku FROM order_lines")
        .join_column("order_id")
        .info_parser(std::sync::Arc::new(|r: &Row| {
            r.get("sku")
                .and_then(Value::render)
                .filter(|s| s.starts_with('A'))
        }));

    enricher.enrich(&mut table, &[upper, lower]).await.unwrap();

    assert_eq!(executor.batches().len(), 2);
    assert_eq!(table.rows()[0].get("skus"), Some(&Value::from("A-1, B-1")));
    assert_eq!(table.rows()[0].get("first_sku"), Some(&Value::from("A-1")));
}

#[test]
fn correlated_subquery_never_executes() {
    let executor = MemoryExecutor::new("order_id", order_lines(1));
    let column = ConcatColumn::new("OrderId", "Skus", "SELECT * FROM order_lines").filter_column("Sku");
    let mut bindings = Bindings::new();

    let sql = build_correlated_subquery("widget", &column, &mut bindings);

    assert!(sql.starts_with("\"OrderId\" IN ( SELECT \"OrderId\" FROM ( "));
    assert!(sql.ends_with(" )"));
    assert_eq!(bindings.len(), 1);
    assert!(executor.batches().is_empty());
}
