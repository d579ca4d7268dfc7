//! Round trip against a live PostgreSQL
//!
//! Needs `DATABASE_URL`; run with `cargo test -- --ignored`.

use rowmapper::prelude::*;
use std::sync::Arc;

const TABLE: &str = "rowmapper_roundtrip_people";

async fn setup_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", TABLE))
        .execute(&pool)
        .await
        .expect("Failed to drop table");
    sqlx::query(&format!(
        "CREATE TABLE {} (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            age INT,
            nickname TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        TABLE
    ))
    .execute(&pool)
    .await
    .expect("Failed to create table");

    pool
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

#[tokio::test]
#[ignore]
async fn test_mapper_round_trip() {
    let pool = setup_pool().await;
    let hub = MapperHub::from_pool(pool, MapperSettings::default(), GridSettings::default());
    hub.health_check().await.unwrap();
    let people = hub.mapper(TABLE, "id");

    people
        .persist(&row(json!({"name": "Ana", "status": "active", "age": 31})))
        .await
        .unwrap();
    let stored = people.row_last_persist().await.unwrap().unwrap();
    let id = stored["id"].clone();
    assert_eq!(stored["name"], json!("Ana"));
    assert!(stored["created_at"].is_string());

    // Update through persist, clearing the nickname with the NULL marker
    let mut raw = RawRow::new();
    raw.insert("id".into(), id.clone().into());
    raw.insert("nickname".into(), Nullable::create().into());
    raw.insert("age".into(), 32i64.into());
    raw.insert("created_at".into(), "2001-01-01T00:00:00Z".into());
    people.persist(&raw).await.unwrap();

    let updated = people.find(id.clone()).await.unwrap().unwrap();
    assert_eq!(updated["age"], json!(32));
    assert_eq!(updated["nickname"], Value::Null);
    assert_eq!(updated["created_at"], stored["created_at"]);

    let removed = people.remove(id.clone()).await.unwrap();
    assert_eq!(removed.affected_rows(), 1);
    assert!(people.find(id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_grid_round_trip() {
    let pool = setup_pool().await;
    let executor: Arc<dyn Executor> = Arc::new(PgExecutor::new(pool));
    let people = TableMapper::new(MapperConfig::new(TABLE, "id")).with_executor(executor.clone());

    for n in 1..=12 {
        let status = if n % 3 == 0 { "inactive" } else { "active" };
        people
            .insert(&row(json!({"name": format!("p{:02}", n), "status": status, "age": 20 + n})))
            .await
            .unwrap();
    }

    let grid = Grid::new(executor, people.select().unwrap());
    let params = GridParams::new()
        .search(json!({"groupOp": "AND", "rules": [
            {"field": "status", "op": "eq", "data": "active"},
            {"field": "name", "op": "bw", "data": "p"}
        ]}))
        .sort("age", "desc")
        .rows(5)
        .page(2);

    let envelope = grid.resultset(&params).await.unwrap();
    assert_eq!(envelope.records, 8);
    assert_eq!(envelope.total, 2);
    assert_eq!(envelope.page, 2);
    let names: Vec<&str> = envelope
        .rows
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["p04", "p02", "p01"]);

    let replay = grid.from_token(&envelope.userdata.q).await.unwrap();
    assert_eq!(replay.resultset(&GridParams::new()).await.unwrap().records, 8);

    // Rule data arrives as text whatever the column type
    let typed = GridParams::new().search(json!({"groupOp": "AND", "rules": [
        {"field": "age", "op": "gt", "data": "25"},
        {"field": "created_at", "op": "ge", "data": "2000-01-01"}
    ]}));
    assert_eq!(grid.resultset(&typed).await.unwrap().records, 7);

    let pattern = GridParams::new().search(json!({"groupOp": "AND", "rules": [
        {"field": "age", "op": "cn", "data": "2"}
    ]}));
    // 21..29 and 32
    assert_eq!(grid.resultset(&pattern).await.unwrap().records, 10);
}
