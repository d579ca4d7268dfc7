use rowmapper::prelude::*;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Person {
    id: Option<i64>,
    name: String,
    status: String,
    age: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("🚀 rowmapper grid demo\n");

    // Use Postgres when a config file is around, otherwise stay in memory
    let executor: Arc<dyn Executor> = match AppConfig::load() {
        Ok(config) => {
            let hub = MapperHub::from_config(&config).await?;
            hub.health_check().await?;
            println!("✅ Database connected");
            hub.executor()
        }
        Err(e) => {
            println!("⚠️  No database config ({}), using the in-memory executor", e);
            Arc::new(MemoryExecutor::new().with_table("people", "id", Vec::new()))
        }
    };

    let people = TableMapper::new(MapperConfig::new("people", "id")).with_executor(executor.clone());

    // Persist: rows without an id are inserted
    for (n, status) in ["active", "inactive", "active", "active", "inactive", "active"]
        .iter()
        .enumerate()
    {
        let person = Person {
            id: None,
            name: format!("person-{}", n + 1),
            status: status.to_string(),
            age: 20 + 7 * n as i64,
        };
        people.persist(&Serialized::new(&person)).await?;
    }
    println!("✅ Inserted 6 people, last: {:?}", people.row_last_persist().await?);

    // Persist with an id updates that row
    let renamed = Person {
        id: Some(1),
        name: "Ana".to_string(),
        status: "active".to_string(),
        age: 21,
    };
    people.persist(&Serialized::new(&renamed)).await?;
    println!("✅ Updated: {:?}", people.find(1).await?);

    // A grid request as it arrives from the browser
    let grid = Grid::new(executor, people.select()?).with_ignore_fields(["actions"]);
    let params = GridParams::from_pairs([
        ("_search", "true"),
        (
            "filters",
            r#"{"groupOp":"AND","rules":[{"field":"status","op":"eq","data":"active"},{"field":"actions","op":"eq","data":"x"}]}"#,
        ),
        ("sidx", "age"),
        ("sord", "desc"),
        ("page", "1"),
        ("rows", "3"),
    ])?;

    let envelope = grid.resultset(&params).await?;
    println!("\n📋 Page {} of {} ({} records)", envelope.page, envelope.total, envelope.records);
    println!("{}", serde_json::to_string_pretty(&envelope.rows)?);

    // The token replays the same filtered query for the next page
    let next = grid.from_token(&envelope.userdata.q).await?;
    let page_two = next.resultset(&GridParams::new().page(2).rows(3)).await?;
    println!("\n📋 Page {}: {} rows", page_two.page, page_two.rows.len());

    Ok(())
}
