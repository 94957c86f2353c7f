//! Catalog building and list dispatch against an in-memory data source.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vista_core::{
    ColumnModel, ColumnTypeDescriptor, ConfigError, ConnectionConfig, Error, HostType, NativeType,
    Operator, QualValue, Qualifier, ResultRecord, TableModel, Value,
};
use vista_runtime::{Catalog, DataSource, RecordStream, TableKind};

#[derive(Clone)]
enum Step {
    Row(ResultRecord),
    Fail(&'static str),
}

#[derive(Default)]
struct MemorySource {
    tables: Vec<TableModel>,
    results: HashMap<String, Vec<Step>>,
    fail_introspect: bool,
    queries: Mutex<Vec<String>>,
    rows_read: Arc<AtomicUsize>,
}

impl MemorySource {
    fn with_results(mut self, sql: &str, steps: Vec<Step>) -> Self {
        self.results.insert(sql.to_string(), steps);
        self
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn introspect(
        &self,
        _connection_string: &str,
        schema: &str,
    ) -> vista_core::Result<Vec<TableModel>> {
        if self.fail_introspect {
            return Err(Error::introspection(schema, "permission denied for schema"));
        }
        Ok(self.tables.clone())
    }

    fn query(&self, _connection_string: &str, sql: String) -> RecordStream {
        self.queries.lock().unwrap().push(sql.clone());
        let steps = self.results.get(&sql).cloned().unwrap_or_default();
        let rows_read = self.rows_read.clone();
        futures::stream::iter(steps)
            .map(move |step| {
                rows_read.fetch_add(1, Ordering::SeqCst);
                match step {
                    Step::Row(record) => Ok(record),
                    Step::Fail(msg) => Err(Error::query(sql.clone(), msg)),
                }
            })
            .boxed()
    }
}

fn column(name: &str, native: NativeType, raw: &str) -> ColumnModel {
    ColumnModel::new(name, ColumnTypeDescriptor::new(native, raw))
}

fn users_table() -> TableModel {
    TableModel::new("users")
        .with_comment("Application users")
        .with_column(column("id", NativeType::Integer, "bigint"))
        .with_column(column("name", NativeType::String, "text").with_comment("Display name"))
        .with_column(column("age", NativeType::Integer, "integer"))
        .with_column(column("tags", NativeType::Array, "text[]"))
}

fn user(id: i64, name: Option<&str>) -> ResultRecord {
    let mut record = ResultRecord::new();
    record.insert("id", Value::Int(id));
    record.insert(
        "name",
        name.map(|n| Value::String(n.to_string())).unwrap_or(Value::Null),
    );
    record
}

fn config(patterns: &[&str]) -> ConnectionConfig {
    ConnectionConfig {
        connection_string: Some("postgres://test@localhost/test".to_string()),
        tables_to_expose: patterns.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
}

async fn catalog(source: MemorySource, patterns: &[&str]) -> (Catalog, Arc<MemorySource>) {
    let source = Arc::new(source);
    let catalog = Catalog::build(&config(patterns), source.clone()).await.unwrap();
    (catalog, source)
}

fn sample_source() -> MemorySource {
    MemorySource {
        tables: vec![
            users_table(),
            TableModel::new("user_roles").with_column(column("role", NativeType::Enum, "role")),
            TableModel::new("orders").with_column(column("total", NativeType::Decimal, "numeric")),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_build_registers_matching_tables_and_raw_query() {
    let (catalog, _) = catalog(sample_source(), &["user_*", "*"]).await;

    let names: Vec<_> = catalog.tables().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "raw_query", "user_roles", "users"]);

    let users = catalog.get("users").unwrap();
    assert_eq!(users.description, "Application users");
    assert_eq!(users.kind, TableKind::Dynamic);
    let cols: Vec<_> = users.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(cols, vec!["id", "name", "age"]);
    assert_eq!(users.get_column("name").unwrap().description, "Display name");
    assert_eq!(catalog.get("orders").unwrap().columns[0].host_type, HostType::Double);
}

#[tokio::test]
async fn test_build_with_no_matching_pattern() {
    let (catalog, _) = catalog(sample_source(), &["nomatch*"]).await;
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get("raw_query").unwrap().kind, TableKind::RawQuery);
}

#[tokio::test]
async fn test_build_defaults_to_all_tables_in_public() {
    let (catalog, _) = catalog(sample_source(), &[]).await;
    assert_eq!(catalog.schema(), "public");
    assert_eq!(catalog.len(), 4);
}

#[tokio::test]
async fn test_build_rejects_invalid_schema() {
    let cfg = ConnectionConfig {
        schema: Some("bad schema".to_string()),
        ..config(&[])
    };
    let source = Arc::new(sample_source());
    let err = Catalog::build(&cfg, source).await.unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::InvalidSchema(_))));
}

#[tokio::test]
async fn test_build_with_custom_schema() {
    let cfg = ConnectionConfig {
        schema: Some("sales".to_string()),
        ..config(&["orders"])
    };
    let source = Arc::new(sample_source().with_results("SELECT * FROM sales.orders", vec![]));
    let catalog = Catalog::build(&cfg, source.clone()).await.unwrap();

    catalog.list("orders", &[], &mut |_: ResultRecord| true).await.unwrap();

    assert_eq!(catalog.schema(), "sales");
    assert_eq!(source.queries(), vec!["SELECT * FROM sales.orders"]);
}

#[tokio::test]
async fn test_build_surfaces_introspection_error() {
    let source = MemorySource {
        fail_introspect: true,
        ..sample_source()
    };
    let err = Catalog::build(&config(&["*"]), Arc::new(source)).await.unwrap_err();
    assert!(matches!(err, Error::Introspection { ref schema, .. } if schema == "public"));
}

#[tokio::test]
async fn test_list_without_filters_omits_where() {
    let source = sample_source().with_results(
        "SELECT * FROM public.users",
        vec![Step::Row(user(1, Some("Ada"))), Step::Row(user(2, None))],
    );
    let (catalog, source) = catalog(source, &["*"]).await;

    let mut rows = Vec::new();
    let count = catalog
        .list("users", &[], &mut |r: ResultRecord| {
            rows.push(r);
            true
        })
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(source.queries(), vec!["SELECT * FROM public.users"]);
    assert_eq!(rows[0].get("name"), Some(&Value::String("Ada".to_string())));
    assert_eq!(rows[1].get("name"), Some(&Value::Null));
}

#[tokio::test]
async fn test_list_renders_qualifiers() {
    let (catalog, source) = catalog(sample_source(), &["*"]).await;
    let quals = vec![
        Qualifier::new("name", Operator::Eq, QualValue::String("active".to_string())),
        Qualifier::new("age", Operator::GtEq, QualValue::Int(18)),
    ];

    let count = catalog.list("users", &quals, &mut |_: ResultRecord| true).await.unwrap();

    assert_eq!(count, 0);
    assert_eq!(
        source.queries(),
        vec!["SELECT * FROM public.users WHERE name = 'active' AND age >= 18"]
    );
}

#[tokio::test]
async fn test_escaping_is_opt_in() {
    let quals = vec![Qualifier::new(
        "name",
        Operator::Eq,
        QualValue::String("O'Brien".to_string()),
    )];

    let (plain, _) = catalog(sample_source(), &["*"]).await;
    assert_eq!(
        plain.sql_for("users", &quals).unwrap(),
        "SELECT * FROM public.users WHERE name = 'O'Brien'"
    );

    let cfg = ConnectionConfig {
        escape_string_literals: true,
        ..config(&["*"])
    };
    let hardened = Catalog::build(&cfg, Arc::new(sample_source())).await.unwrap();
    assert_eq!(
        hardened.sql_for("users", &quals).unwrap(),
        "SELECT * FROM public.users WHERE name = 'O''Brien'"
    );
}

#[tokio::test]
async fn test_error_mid_stream_keeps_earlier_rows() {
    let source = sample_source().with_results(
        "SELECT * FROM public.users",
        vec![
            Step::Row(user(1, Some("Ada"))),
            Step::Row(user(2, Some("Grace"))),
            Step::Fail("canceling statement due to conflict"),
            Step::Row(user(3, Some("Barbara"))),
        ],
    );
    let (catalog, _) = catalog(source, &["*"]).await;

    let mut rows = Vec::new();
    let err = catalog
        .list("users", &[], &mut |r: ResultRecord| {
            rows.push(r);
            true
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Query { .. }));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("id"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn test_sink_can_stop_the_stream() {
    let source = sample_source().with_results(
        "SELECT * FROM public.users",
        vec![
            Step::Row(user(1, None)),
            Step::Row(user(2, None)),
            Step::Row(user(3, None)),
        ],
    );
    let (catalog, source) = catalog(source, &["*"]).await;

    let mut seen = 0;
    let count = catalog
        .list("users", &[], &mut |_: ResultRecord| {
            seen += 1;
            seen < 2
        })
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(source.rows_read.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unknown_table() {
    let (catalog, _) = catalog(sample_source(), &["users"]).await;
    let err = catalog.list("orders", &[], &mut |_: ResultRecord| true).await.unwrap_err();
    assert!(matches!(err, Error::UnknownTable { ref name } if name == "orders"));
}

#[tokio::test]
async fn test_raw_query_wraps_result_set() {
    let sql = "select id, name from users order by id";
    let source = sample_source().with_results(
        sql,
        vec![Step::Row(user(1, Some("Ada"))), Step::Row(user(2, None))],
    );
    let (catalog, source) = catalog(source, &["*"]).await;

    let quals = vec![Qualifier::new(
        "query",
        Operator::Eq,
        QualValue::String(sql.to_string()),
    )];
    let mut rows = Vec::new();
    let count = catalog
        .list("raw_query", &quals, &mut |r: ResultRecord| {
            rows.push(r);
            true
        })
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(source.queries(), vec![sql]);
    assert_eq!(rows[0].get("query"), Some(&Value::String(sql.to_string())));
    assert_eq!(
        rows[0].get("data"),
        Some(&Value::Json(json!([
            {"id": 1, "name": "Ada"},
            {"id": 2, "name": null}
        ])))
    );
}

#[tokio::test]
async fn test_raw_query_with_empty_result() {
    let (catalog, _) = catalog(sample_source(), &["*"]).await;
    let quals = vec![Qualifier::new(
        "query",
        Operator::Eq,
        QualValue::String("select 1 where false".to_string()),
    )];
    let stream = catalog.stream("raw_query", &quals).unwrap();
    let rows: Vec<_> = stream.collect().await;
    assert_eq!(rows.len(), 1);
    let record = rows.into_iter().next().unwrap().unwrap();
    assert_eq!(record.get("data"), Some(&Value::Json(json!([]))));
}

#[tokio::test]
async fn test_raw_query_requires_query_qualifier() {
    let (catalog, source) = catalog(sample_source(), &["*"]).await;
    let err = catalog.list("raw_query", &[], &mut |_: ResultRecord| true).await.unwrap_err();
    assert!(matches!(err, Error::MissingQualifier { ref column, .. } if column == "query"));
    assert!(source.queries().is_empty());
}

#[tokio::test]
async fn test_catalog_is_shared_across_tasks() {
    let source = sample_source()
        .with_results("SELECT * FROM public.users", vec![Step::Row(user(1, None))])
        .with_results(
            "SELECT * FROM public.users WHERE id = 2",
            vec![Step::Row(user(2, None))],
        );
    let (catalog, _) = catalog(source, &["*"]).await;
    let catalog = Arc::new(catalog);

    let a = {
        let catalog = catalog.clone();
        tokio::spawn(async move { catalog.list("users", &[], &mut |_: ResultRecord| true).await })
    };
    let b = {
        let catalog = catalog.clone();
        tokio::spawn(async move {
            let quals = vec![Qualifier::new("id", Operator::Eq, QualValue::Int(2))];
            catalog.list("users", &quals, &mut |_: ResultRecord| true).await
        })
    };

    assert_eq!(a.await.unwrap().unwrap(), 1);
    assert_eq!(b.await.unwrap().unwrap(), 1);
}
