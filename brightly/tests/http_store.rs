//! HttpDocumentStore against a mocked object-store API, including the
//! mirror's fail-safe behavior when the listing endpoint goes away.

use std::sync::Arc;

use brightly::error::BrightlyError;
use brightly::store::{DocumentMirror, DocumentStore, HttpDocumentStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> HttpDocumentStore {
    HttpDocumentStore::new(&server.uri(), 5).unwrap()
}

#[tokio::test]
async fn list_fetches_every_object_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "fees.txt"},
            {"name": "staff.txt"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/objects/fees.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Tuition is 50000."))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/objects/staff.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Dr. Rao is the principal."))
        .mount(&server)
        .await;

    let documents = store_for(&server).list().await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, "fees.txt");
    assert_eq!(documents[0].content, "Tuition is 50000.");
}

#[tokio::test]
async fn fetch_maps_missing_objects_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects/nope.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(matches!(
        store_for(&server).fetch("nope.txt").await,
        Err(BrightlyError::NotFound(_))
    ));
}

#[tokio::test]
async fn put_and_delete_hit_the_object_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/objects/fees.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/objects/fees.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.put("fees.txt", "Tuition is 50000.").await.unwrap();
    store.delete("fees.txt").await.unwrap();
}

#[tokio::test]
async fn listing_failure_is_sync_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(matches!(
        store_for(&server).list().await,
        Err(BrightlyError::SyncUnavailable(_))
    ));
}

#[tokio::test]
async fn mirror_survives_a_remote_outage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "fees.txt"}
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/objects/fees.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Tuition is 50000."))
        .mount(&server)
        .await;
    // After the first listing, the endpoint starts failing.
    Mock::given(method("GET"))
        .and(path("/objects"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let workspace = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(store_for(&server));
    let mirror = DocumentMirror::new(
        store,
        workspace.path().join("data"),
        workspace.path().join("file_hashes.json"),
    );

    assert!(mirror.sync().await.unwrap());
    assert_eq!(mirror.load_documents().unwrap().len(), 1);

    // Outage: no change reported, nothing deleted locally.
    assert!(!mirror.sync().await.unwrap());
    assert_eq!(mirror.load_documents().unwrap().len(), 1);
    assert_eq!(mirror.load_manifest().len(), 1);
}
