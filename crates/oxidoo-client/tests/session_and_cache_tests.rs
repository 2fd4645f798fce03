//! Session persistence and one-shot result caching over a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use oxidoo_client::{CacheStore, Client, MemoryStore, Options};
use oxidoo_protocol::{methods, Error};
use oxidoo_transport::mock::MockTransport;

fn client_with_store(transport: Arc<MockTransport>, store: Arc<MemoryStore>) -> Client {
    Client::builder()
        .with_transport(transport)
        .with_cache_store(store)
        .with_database("prod")
        .with_credentials("admin", "secret")
        .build()
        .unwrap()
}

fn script_authentication(transport: &MockTransport, uid: i64) {
    transport.push_ok(json!(uid));
    transport.push_ok(json!({}));
}

#[tokio::test]
async fn activate_without_store_is_a_hard_failure() {
    let client = Client::builder()
        .with_transport(Arc::new(MockTransport::new()))
        .with_database("prod")
        .with_credentials("admin", "secret")
        .build()
        .unwrap();

    let err = client.activate_cache(None).unwrap_err();
    assert_eq!(err, Error::CacheNotConfigured);
}

#[tokio::test]
async fn cache_activation_covers_exactly_one_call() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    script_authentication(&transport, 2);
    // Three search results for the three calls that reach the transport.
    transport.push_ok(json!([1]));
    transport.push_ok(json!([1]));
    transport.push_ok(json!([1]));

    let client = client_with_store(transport.clone(), store);
    let options = || Options::new().model("res.partner").limit(10);

    // Armed: miss, computes and stores.
    client.activate_cache(None).unwrap();
    client.search(options()).await.unwrap();
    let after_first = transport.calls_to(methods::EXECUTE);

    // Not armed: bypasses the cache despite the fresh entry.
    client.search(options()).await.unwrap();
    assert_eq!(transport.calls_to(methods::EXECUTE), after_first + 1);

    // Re-armed: identical params, served from the store.
    client.activate_cache(None).unwrap();
    client.search(options()).await.unwrap();
    assert_eq!(transport.calls_to(methods::EXECUTE), after_first + 1);

    // Consumed again by the hit: back to the transport.
    client.search(options()).await.unwrap();
    assert_eq!(transport.calls_to(methods::EXECUTE), after_first + 2);
}

#[tokio::test]
async fn cached_entries_are_keyed_by_parameters() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    script_authentication(&transport, 2);
    transport.push_ok(json!([1]));
    transport.push_ok(json!([2]));

    let client = client_with_store(transport.clone(), store);

    client.activate_cache(None).unwrap();
    client
        .search(Options::new().model("res.partner").limit(10))
        .await
        .unwrap();

    // Different limit, different key: armed lookup misses and recomputes.
    client.activate_cache(None).unwrap();
    let second = client
        .search(Options::new().model("res.partner").limit(20))
        .await
        .unwrap();

    assert_eq!(second, json!([2]));
}

#[tokio::test]
async fn cache_hit_returns_the_stored_result() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    script_authentication(&transport, 2);
    transport.push_ok(json!([10, 20]));

    let client = client_with_store(transport.clone(), store);
    let options = || Options::new().model("res.partner");

    client.activate_cache(Some(Duration::from_secs(300))).unwrap();
    let first = client.search(options()).await.unwrap();

    client.activate_cache(None).unwrap();
    let second = client.search(options()).await.unwrap();

    assert_eq!(first, second);
    // Only the first search reached the transport.
    assert_eq!(transport.calls_to(methods::EXECUTE), 2); // context fetch + one search
}

#[tokio::test]
async fn mutations_never_touch_the_cache() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    script_authentication(&transport, 2);
    transport.push_ok(json!(true));

    let client = client_with_store(transport.clone(), store.clone());

    // Arm the cache, then run a mutation: the directive must survive for
    // the next read-like call, and nothing must be stored for the write.
    client.activate_cache(None).unwrap();
    let mut data = serde_json::Map::new();
    data.insert("name".to_string(), json!("Acme"));
    client
        .write(Options::new().model("res.partner").ids([1]).data(data))
        .await
        .unwrap();

    // The only store entry may be the persisted session.
    assert!(store.len() <= 1);
}

#[tokio::test]
async fn session_is_restored_from_the_store_without_login() {
    let store = Arc::new(MemoryStore::new());
    store.set(
        "__authentication",
        json!({"uid": 9, "context": {"tz": "UTC"}, "authenticated_at": "2026-08-07T10:00:00Z"}),
        None,
    );
    let transport = Arc::new(MockTransport::new());
    transport.push_ok(json!([1]));

    let client = client_with_store(transport.clone(), store);
    client.search(Options::new().model("res.partner")).await.unwrap();

    assert_eq!(transport.calls_to(methods::LOGIN), 0);
    // The restored context flows into the positional array.
    let call = transport.calls().pop().unwrap();
    assert_eq!(call.args[1], json!(9));
    assert_eq!(call.args[9], json!({"tz": "UTC"}));
}

#[tokio::test]
async fn fresh_login_persists_the_session() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    script_authentication(&transport, 4);
    transport.push_ok(json!([1]));

    let client = client_with_store(transport.clone(), store.clone());
    client.search(Options::new().model("res.partner")).await.unwrap();

    let persisted = store.get("__authentication").expect("session should be persisted");
    assert_eq!(persisted.get("uid"), Some(&json!(4)));
}

#[tokio::test]
async fn invalidated_session_triggers_a_new_login() {
    let transport = Arc::new(MockTransport::new());
    script_authentication(&transport, 2);
    transport.push_ok(json!([1]));
    script_authentication(&transport, 2);
    transport.push_ok(json!([1]));

    let client = Client::builder()
        .with_transport(transport.clone())
        .with_database("prod")
        .with_credentials("admin", "secret")
        .build()
        .unwrap();

    client.search(Options::new().model("res.partner")).await.unwrap();
    client.invalidate_session().await;
    client.search(Options::new().model("res.partner")).await.unwrap();

    assert_eq!(transport.calls_to(methods::LOGIN), 2);
}

#[tokio::test]
async fn rejected_login_surfaces_before_the_operation() {
    let transport = Arc::new(MockTransport::new());
    transport.push_ok(json!(false));

    let client = Client::builder()
        .with_transport(transport.clone())
        .with_database("prod")
        .with_credentials("admin", "wrong")
        .build()
        .unwrap();

    let err = client.search(Options::new().model("res.partner")).await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(transport.calls_to(methods::EXECUTE), 0);
}
