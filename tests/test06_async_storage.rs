use sqlrunner::prelude::*;
use tokio::runtime::Runtime;

fn async_storage(auto_commit: bool) -> Result<(SqliteConnection, AsyncStorage<SqliteConnection>), Box<dyn std::error::Error>> {
    let conn = SqliteConnection::open_in_memory()?;
    conn.execute_batch("CREATE TABLE orders (id INTEGER PRIMARY KEY, total TEXT NOT NULL)")?;
    let storage = Storage::builder()
        .connection(conn.clone())
        .add_query("orders.insert", "INSERT INTO orders (id, total) VALUES (?, ?)")
        .add_query("orders.all", "SELECT id, total FROM orders ORDER BY id")
        .config(StorageConfig::builder().auto_commit(auto_commit).build()?)
        .build()?;
    Ok((conn, AsyncStorage::from(storage)))
}

#[test]
fn test06_async_writes_and_reads() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let (_conn, storage) = async_storage(true)?;

        let mut tasks = tokio::task::JoinSet::new();
        for id in 0..20 {
            let storage = storage.clone();
            tasks.spawn(async move {
                storage
                    .write_batched(
                        "orders.insert",
                        vec![ParamValue::Int(id), ParamValue::Decimal(format!("{id}.00"))],
                        5,
                    )
                    .await
            });
        }
        let mut affected = 0;
        while let Some(joined) = tasks.join_next().await {
            affected += joined??;
        }
        assert_eq!(affected, 20);

        let rows = storage.read("orders.all", vec![]).await?;
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[3][1].as_text(), Some("3.00"));
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn test06_async_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let (conn, storage) = async_storage(false)?;

        storage
            .write("orders.insert", vec![ParamValue::Int(1), ParamValue::from("10.00")])
            .await?;
        assert!(conn.in_transaction());
        storage.rollback().await?;
        assert!(storage.read("orders.all", vec![]).await?.is_empty());

        storage
            .write("orders.insert", vec![ParamValue::Int(2), ParamValue::from("20.00")])
            .await?;
        storage.commit().await?;
        assert!(!conn.in_transaction());

        let err = storage.read("orders.missing", vec![]).await.unwrap_err();
        assert_eq!(err.code(), "QUERY_NOT_FOUND");

        storage.close().await;
        assert!(storage.blocking().query_names().is_empty());
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
