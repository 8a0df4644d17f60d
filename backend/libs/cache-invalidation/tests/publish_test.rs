//! Integration tests for the stale-view publisher
//!
//! These tests require a running Redis instance.
//! Run with: REDIS_URL=redis://127.0.0.1:6379 cargo test --test publish_test -- --ignored

use cache_invalidation::{InvalidationMessage, InvalidationPublisher, StaleView};
use futures_util::StreamExt;
use std::time::Duration;
use uuid::Uuid;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

#[tokio::test]
#[ignore = "Requires Redis server"]
async fn test_publish_reaches_subscriber() {
    let url = redis_url();
    let channel = format!("views:stale:test:{}", Uuid::new_v4());

    let client = redis::Client::open(url.as_str()).expect("redis client");
    let mut pubsub = client.get_async_pubsub().await.expect("pubsub");
    pubsub.subscribe(&channel).await.expect("subscribe");

    let publisher =
        InvalidationPublisher::with_channel(&url, "test-service".to_string(), channel.clone())
            .await
            .expect("publisher");

    let post_id = Uuid::new_v4();
    let receivers = publisher
        .invalidate(vec![StaleView::Home, StaleView::Post(post_id)])
        .await
        .expect("publish");
    assert_eq!(receivers, 1);

    let mut stream = pubsub.on_message();
    let msg = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("message within timeout")
        .expect("stream open");
    let payload: String = msg.get_payload().expect("payload");
    let decoded: InvalidationMessage = serde_json::from_str(&payload).expect("json");

    assert_eq!(decoded.source_service, "test-service");
    assert_eq!(decoded.views, vec![StaleView::Home, StaleView::Post(post_id)]);
}

#[tokio::test]
#[ignore = "Requires Redis server"]
async fn test_empty_invalidation_is_not_published() {
    let publisher = InvalidationPublisher::new(&redis_url(), "test-service".to_string())
        .await
        .expect("publisher");

    let receivers = publisher.invalidate(Vec::new()).await.expect("no-op");
    assert_eq!(receivers, 0);
}
