//! Runs the client through the real AWS SDK against an in-process mock.

use std::net::SocketAddr;

use dynamock::{create_app, AppState, Config};
use dynamock_client::{
    create_client, describe_table_status, list_table_names, ClientError, ConnectionConfig,
    EndpointOverride,
};
use tokio::net::TcpListener;

async fn start_mock(tables: &[&str], max_list_tables: usize) -> SocketAddr {
    let config = Config {
        request_timeout_seconds: 10,
        max_list_tables,
    };
    let names: Vec<String> = tables.iter().map(|name| name.to_string()).collect();
    let state = AppState::seeded(config, &names).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_app(state)).await.unwrap();
    });
    addr
}

fn local_config(addr: SocketAddr) -> ConnectionConfig {
    ConnectionConfig {
        access_key_id: Some("test".to_string()),
        secret_access_key: Some("test".to_string()),
        region: "us-east-1".to_string(),
        endpoint: Some(EndpointOverride {
            url: addr.to_string(),
            use_ssl: false,
        }),
    }
}

#[tokio::test]
async fn test_list_table_names() {
    let addr = start_mock(&["bar", "baz"], 100).await;
    let client = create_client(&local_config(addr)).await;

    let names = list_table_names(&client).await.unwrap();

    assert_eq!(names, vec!["bar", "baz"]);
}

#[tokio::test]
async fn test_list_table_names_follows_pages() {
    let addr = start_mock(&["aaa", "bbb", "ccc", "ddd", "eee"], 2).await;
    let client = create_client(&local_config(addr)).await;

    let names = list_table_names(&client).await.unwrap();

    assert_eq!(names, vec!["aaa", "bbb", "ccc", "ddd", "eee"]);
}

#[tokio::test]
async fn test_describe_table_status() {
    let addr = start_mock(&["bar"], 100).await;
    let client = create_client(&local_config(addr)).await;

    let summary = describe_table_status(&client, "bar").await.unwrap();

    assert_eq!(summary.name, "bar");
    assert_eq!(summary.status, "ACTIVE");
    assert_eq!(summary.item_count, Some(0));
}

#[tokio::test]
async fn test_describe_missing_table() {
    let addr = start_mock(&["bar"], 100).await;
    let client = create_client(&local_config(addr)).await;

    let err = describe_table_status(&client, "fh-data-import-tasks-data")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::TableNotFound { ref table } if table == "fh-data-import-tasks-data"
    ));
}
