//! End-to-end tests: `lantern-client` against a real server on a loopback port.

use lantern::api::{ServerOptions, serve};
use lantern_client::{ClientError, LanternClient};
use lantern_core::{CacheError, GraphCache, IlluminateQuery, Optimization, SweepStats};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    url: String,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<SweepStats, CacheError>>,
}

impl TestServer {
    async fn start(options: ServerOptions) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));
        let (stop, stopped) = oneshot::channel::<()>();
        let cache = GraphCache::new(Duration::from_secs(60));

        let task = tokio::spawn(async move {
            serve(
                listener,
                cache,
                &options,
                Duration::from_millis(50),
                async move {
                    let _ = stopped.await;
                },
            )
            .await
        });

        Self { url, stop, task }
    }

    async fn stop(self) -> SweepStats {
        let _ = self.stop.send(());
        self.task
            .await
            .expect("server task")
            .expect("server result")
    }
}

fn open_options() -> ServerOptions {
    ServerOptions {
        api_key: None,
        rate_limit: 0,
        cors_origins: None,
    }
}

#[tokio::test]
async fn health_and_status() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    let health = client.health().await.expect("health");
    assert_eq!(health.status, "ok");

    let status = client.status().await.expect("status");
    assert_eq!(status.vertices, 0);
    assert_eq!(status.default_ttl_seconds, 60);

    server.stop().await;
}

#[tokio::test]
async fn vertex_lifecycle() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    client.put_vertex("n", 42_i64, None).await.expect("put int");
    client
        .put_vertex("name", "lantern", None)
        .await
        .expect("put string");
    client
        .put_vertex("blob", vec![0_u8, 1, 2], None)
        .await
        .expect("put bytes");

    let n = client.get_vertex("n").await.expect("get n");
    assert_eq!(n.int_value().expect("int"), 42);
    assert!(n.string_value().is_err());

    let name = client.get_vertex("name").await.expect("get name");
    assert_eq!(name.string_value().expect("string"), "lantern");

    let blob = client.get_vertex("blob").await.expect("get blob");
    assert_eq!(blob.bytes_value().expect("bytes"), &[0, 1, 2]);

    client.delete_vertex("n").await.expect("delete");
    assert!(matches!(
        client.get_vertex("n").await,
        Err(ClientError::NotFound(_))
    ));

    server.stop().await;
}

#[tokio::test]
async fn keys_with_reserved_characters() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    client
        .add_edge("user/1", "tag #rust", 2.0, None)
        .await
        .expect("add");

    let weight = client.get_edge("user/1", "tag #rust").await.expect("get");
    assert_eq!(weight, 2.0);

    server.stop().await;
}

#[tokio::test]
async fn edge_weights_accumulate() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    client.add_edge("a", "b", 1.0, None).await.expect("add");
    client
        .add_edge_with_ttl("a", "b", 2.5, Duration::from_secs(30))
        .await
        .expect("add with ttl");

    assert_eq!(client.get_edge("a", "b").await.expect("weight"), 3.5);

    client.delete_edge("a", "b").await.expect("delete");
    assert!(matches!(
        client.get_edge("a", "b").await,
        Err(ClientError::NotFound(_))
    ));

    server.stop().await;
}

#[tokio::test]
async fn illuminate_through_client() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    for (tail, head) in [("a", "b"), ("b", "c"), ("a", "f"), ("f", "g")] {
        client.add_edge(tail, head, 1.0, None).await.expect("add");
    }
    client.put_vertex("a", true, None).await.expect("put");

    let query = IlluminateQuery::new("a".to_string(), 2, 2);
    let graph = client.illuminate(&query).await.expect("illuminate");
    assert_eq!(graph.vertex_count(), 5);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.vertices.get("a"), Some(&lantern_core::Value::Bool(true)));

    let tree = client
        .illuminate(
            &IlluminateQuery::new("a".to_string(), 2, 2)
                .with_optimization(Optimization::MinimumSpanningTree),
        )
        .await
        .expect("illuminate mst");
    assert_eq!(tree.vertex_count(), 5);
    assert_eq!(tree.edge_count(), 4);

    server.stop().await;
}

#[tokio::test]
async fn bad_requests_surface_as_client_errors() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    let result = client.add_edge("a", "b", f64::NAN, None).await;
    assert!(result.is_err());

    let query = IlluminateQuery::new("a".to_string(), 500, 1);
    assert!(matches!(
        client.illuminate(&query).await,
        Err(ClientError::BadRequest(_))
    ));

    server.stop().await;
}

#[tokio::test]
async fn api_key_is_sent() {
    let server = TestServer::start(ServerOptions {
        api_key: Some("s3cret".to_string()),
        ..open_options()
    })
    .await;

    let anonymous = LanternClient::new(server.url.clone(), None);
    assert!(matches!(
        anonymous.status().await,
        Err(ClientError::Unauthorized)
    ));
    // Health is always public
    anonymous.health().await.expect("health");

    let authorized = LanternClient::new(server.url.clone(), Some("s3cret".to_string()));
    authorized.status().await.expect("status");

    server.stop().await;
}

#[tokio::test]
async fn unreachable_server() {
    let client = LanternClient::new("http://127.0.0.1:1", None);

    assert!(matches!(
        client.health().await,
        Err(ClientError::ConnectionFailed(_))
    ));
}

#[tokio::test]
async fn shutdown_returns_sweep_totals() {
    let server = TestServer::start(open_options()).await;
    let client = LanternClient::new(server.url.clone(), None);

    client
        .put_vertex_with_ttl("short", 1_i64, Duration::from_secs(1))
        .await
        .expect("put");
    client
        .add_edge_with_ttl("a", "b", 1.0, Duration::from_secs(1))
        .await
        .expect("add");

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert!(matches!(
        client.get_vertex("short").await,
        Err(ClientError::NotFound(_))
    ));

    let swept = server.stop().await;
    assert_eq!(swept.vertices, 1);
    assert_eq!(swept.contributions, 1);
    assert!(swept.ticks > 0);
}
