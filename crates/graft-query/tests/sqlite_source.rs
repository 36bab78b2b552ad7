use graft_core::{FieldName, TypeName};
use graft_model::{EntitySchema, FieldKind, FieldSpec, Record, SortDirection, SortOrder};
use graft_query::{
    ConnectionResolver, CursorCodec, FetchQuery, MemorySource, OrderedSource, PageArgs,
    PageLimits, ScanDirection, SqliteSource,
};
use rusqlite::Connection;
use serde_json::json;

fn schema() -> EntitySchema {
    EntitySchema::new(
        TypeName::new("Post").expect("type"),
        vec![
            FieldSpec::required(FieldName::new("title").expect("f"), FieldKind::String),
            FieldSpec::optional(FieldName::new("score").expect("f"), FieldKind::Int),
        ],
    )
    .expect("schema")
}

fn records() -> Vec<Record> {
    (0..17)
        .map(|i| {
            let score = if i % 5 == 0 { json!(null) } else { json!(i % 3) };
            Record::new(
                TypeName::new("Post").expect("type"),
                format!("p{i:02}"),
                json!({ "title": format!("post {i}"), "score": score })
                    .as_object()
                    .cloned()
                    .expect("object"),
            )
        })
        .collect()
}

fn setup(schema: &EntitySchema) -> Connection {
    let conn = Connection::open_in_memory().expect("open memory db");
    SqliteSource::create_table(&conn, schema).expect("table");
    let source = SqliteSource::new(&conn, schema);
    for record in records() {
        source.insert(&record).expect("insert");
    }
    conn
}

fn resolver() -> ConnectionResolver {
    ConnectionResolver::new(
        CursorCodec::new(b"sqlite".to_vec()).expect("codec"),
        PageLimits::default(),
    )
    .with_total_count(true)
}

fn walk<S: OrderedSource<Node = Record>>(source: &S, order: &SortOrder, size: i64) -> Vec<String> {
    let resolver = resolver();
    let mut out = Vec::new();
    let mut after = None;
    loop {
        let page = resolver
            .resolve(source, order, &PageArgs::forward(size, after.clone()))
            .expect("page");
        out.extend(page.nodes().map(|r| r.local_id.clone()));
        if !page.page_info.has_next_page {
            return out;
        }
        after = page.page_info.end_cursor;
    }
}

#[test]
fn sqlite_pages_match_memory_source_with_nulls_and_duplicates() {
    let schema = schema();
    let conn = setup(&schema);
    let sqlite = SqliteSource::new(&conn, &schema);
    let memory = MemorySource::new(records());
    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let order = SortOrder::by_field(
            TypeName::new("Post").expect("type"),
            FieldName::new("score").expect("f"),
            direction,
        );
        let from_sql = walk(&sqlite, &order, 4);
        assert_eq!(from_sql.len(), 17);
        assert_eq!(from_sql, walk(&memory, &order, 4), "{direction:?}");
    }
}

#[test]
fn sqlite_backward_page_restores_source_order() {
    let schema = schema();
    let conn = setup(&schema);
    let sqlite = SqliteSource::new(&conn, &schema);
    let order = SortOrder::by_id(TypeName::new("Post").expect("type"));
    let page = resolver()
        .resolve(&sqlite, &order, &PageArgs::backward(3, None))
        .expect("tail");
    let ids: Vec<_> = page.nodes().map(|r| r.local_id.as_str()).collect();
    assert_eq!(ids, vec!["p14", "p15", "p16"]);
    assert!(page.page_info.has_previous_page);
    assert_eq!(page.total_count, Some(17));
    assert_eq!(page.edges[0].node.field("title"), Some(&json!("post 14")));
}

#[test]
fn keyset_query_uses_index() {
    let schema = schema();
    let conn = setup(&schema);
    let sqlite = SqliteSource::new(&conn, &schema);
    let order = SortOrder::by_field(
        TypeName::new("Post").expect("type"),
        FieldName::new("title").expect("f"),
        SortDirection::Asc,
    );
    let plan = sqlite
        .explain_query_plan(&FetchQuery {
            order,
            scan: ScanDirection::Forward,
            boundary: None,
            limit: 5,
        })
        .expect("plan");
    assert!(
        plan.iter().any(|line| line.contains("idx_Post_title")),
        "plan: {plan:?}"
    );
}

#[test]
fn ordering_over_other_type_is_refused() {
    let schema = schema();
    let conn = setup(&schema);
    let sqlite = SqliteSource::new(&conn, &schema);
    let err = sqlite
        .fetch_ordered(&FetchQuery {
            order: SortOrder::by_id(TypeName::new("User").expect("type")),
            scan: ScanDirection::Forward,
            boundary: None,
            limit: 1,
        })
        .expect_err("wrong table");
    assert!(err.message.contains("User"));
}

#[test]
fn stored_values_read_back_with_their_declared_kinds() {
    let schema = EntitySchema::new(
        TypeName::new("Post").expect("type"),
        vec![
            FieldSpec::required(FieldName::new("title").expect("f"), FieldKind::String),
            FieldSpec::optional(FieldName::new("published").expect("f"), FieldKind::Bool),
            FieldSpec::optional(FieldName::new("meta").expect("f"), FieldKind::Json),
            FieldSpec::optional(FieldName::new("rating").expect("f"), FieldKind::Float),
        ],
    )
    .expect("schema");
    let conn = Connection::open_in_memory().expect("open memory db");
    SqliteSource::create_table(&conn, &schema).expect("table");
    let sqlite = SqliteSource::new(&conn, &schema);
    let stored = [
        json!({"title": "a", "published": true, "meta": {"a": 1, "tags": ["x"]}, "rating": 4.5}),
        json!({"title": "b", "published": false, "meta": "plain", "rating": null}),
        json!({"title": "c", "published": null, "meta": null}),
    ];
    let records: Vec<Record> = stored
        .iter()
        .enumerate()
        .map(|(i, fields)| {
            Record::new(
                TypeName::new("Post").expect("type"),
                format!("r{i}"),
                fields.as_object().cloned().expect("object"),
            )
        })
        .collect();
    for record in &records {
        sqlite.insert(record).expect("insert");
    }

    let order = SortOrder::by_field(
        TypeName::new("Post").expect("type"),
        FieldName::new("published").expect("f"),
        SortDirection::Asc,
    );
    let rows = sqlite
        .fetch_ordered(&FetchQuery {
            order: order.clone(),
            scan: ScanDirection::Forward,
            boundary: None,
            limit: 10,
        })
        .expect("rows");
    let from_memory = MemorySource::new(records.clone())
        .fetch_ordered(&FetchQuery {
            order,
            scan: ScanDirection::Forward,
            boundary: None,
            limit: 10,
        })
        .expect("memory rows");
    let keys: Vec<_> = rows.iter().map(|r| r.key.clone()).collect();
    let memory_keys: Vec<_> = from_memory.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, memory_keys);

    let a = rows
        .iter()
        .find(|r| r.node.local_id == "r0")
        .expect("r0");
    assert_eq!(a.node.field("published"), Some(&json!(true)));
    assert_eq!(a.node.field("meta"), Some(&json!({"a": 1, "tags": ["x"]})));
    assert_eq!(a.node.field("rating"), Some(&json!(4.5)));
    let b = rows
        .iter()
        .find(|r| r.node.local_id == "r1")
        .expect("r1");
    assert_eq!(b.node.field("published"), Some(&json!(false)));
    assert_eq!(b.node.field("meta"), Some(&json!("plain")));
}

#[test]
fn undeclared_fields_are_not_stored() {
    let schema = schema();
    let conn = setup(&schema);
    let sqlite = SqliteSource::new(&conn, &schema);
    let record = Record::new(
        TypeName::new("Post").expect("type"),
        "extra",
        json!({"title": "x", "secret": 1})
            .as_object()
            .cloned()
            .expect("object"),
    );
    let err = sqlite.insert(&record).expect_err("undeclared column");
    assert!(err.message.contains("secret"));
}
