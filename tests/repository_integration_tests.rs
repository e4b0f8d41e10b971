use chrono::{Duration, Utc};
use portfolio_api::{
    InMemoryDocumentStore,
    models::{ContactStatus, Fields},
    repository::{DocumentStore, DocumentStoreState, FieldFilter},
    triggers::process_new_contact,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

// --- InMemoryDocumentStore ---

#[tokio::test]
async fn test_insert_assigns_distinct_ids() {
    let store = InMemoryDocumentStore::new();
    let a = store
        .insert("songs", fields(json!({ "title": "a" })), Utc::now())
        .await
        .unwrap();
    let b = store
        .insert("songs", fields(json!({ "title": "a" })), Utc::now())
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(store.count("songs"), 2);
    assert_eq!(store.count("blogs"), 0);
}

#[tokio::test]
async fn test_list_orders_by_created_at_then_insertion() {
    let store = InMemoryDocumentStore::new();
    let t0 = Utc::now();

    store
        .insert("projects", fields(json!({ "title": "old" })), t0 - Duration::hours(1))
        .await
        .unwrap();
    store
        .insert("projects", fields(json!({ "title": "tie-1" })), t0)
        .await
        .unwrap();
    store
        .insert("projects", fields(json!({ "title": "tie-2" })), t0)
        .await
        .unwrap();
    // Inserted last but created earliest.
    store
        .insert("projects", fields(json!({ "title": "backdated" })), t0 - Duration::days(1))
        .await
        .unwrap();

    let titles: Vec<String> = store
        .list("projects", None)
        .await
        .unwrap()
        .iter()
        .filter_map(|d| d.str_field("title").map(str::to_string))
        .collect();

    assert_eq!(titles, vec!["tie-2", "tie-1", "old", "backdated"]);
}

#[tokio::test]
async fn test_list_filter_is_exact() {
    let store = InMemoryDocumentStore::new();
    for category in ["Nature", "nature", "Urban"] {
        store
            .insert("photos", fields(json!({ "category": category })), Utc::now())
            .await
            .unwrap();
    }
    store
        .insert("photos", fields(json!({ "category": 7 })), Utc::now())
        .await
        .unwrap();

    let hits = store
        .list("photos", Some(&FieldFilter::new("category", "Nature")))
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].str_field("category"), Some("Nature"));
}

#[tokio::test]
async fn test_merge_is_shallow_and_keeps_created_at() {
    let store = InMemoryDocumentStore::new();
    let doc = store
        .insert(
            "blogs",
            fields(json!({ "title": "Draft", "content": "body" })),
            Utc::now(),
        )
        .await
        .unwrap();

    let merged = store
        .merge("blogs", &doc.id, fields(json!({ "title": "Final" })))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(merged.str_field("title"), Some("Final"));
    assert_eq!(merged.str_field("content"), Some("body"));
    assert_eq!(merged.created_at, doc.created_at);
}

#[tokio::test]
async fn test_merge_missing_document_writes_nothing() {
    let store = InMemoryDocumentStore::new();
    let result = store
        .merge("blogs", "nope", fields(json!({ "title": "x" })))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(store.count("blogs"), 0);
}

#[tokio::test]
async fn test_delete_reports_whether_removed() {
    let store = InMemoryDocumentStore::new();
    let doc = store
        .insert("songs", fields(json!({ "title": "x" })), Utc::now())
        .await
        .unwrap();

    assert!(store.delete("songs", &doc.id).await.unwrap());
    assert!(!store.delete("songs", &doc.id).await.unwrap());
    assert!(store.get("songs", &doc.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let store = InMemoryDocumentStore::new();
    let doc = store
        .insert("projects", fields(json!({ "title": "x" })), Utc::now())
        .await
        .unwrap();

    assert!(store.get("blogs", &doc.id).await.unwrap().is_none());
    assert!(!store.delete("blogs", &doc.id).await.unwrap());
    assert_eq!(store.count("projects"), 1);
}

#[tokio::test]
async fn test_failing_store() {
    let store = InMemoryDocumentStore::new_failing();
    assert!(store.list("projects", None).await.is_err());
    assert!(
        store
            .insert("projects", Fields::new(), Utc::now())
            .await
            .is_err()
    );
}

// --- Contact Trigger ---

#[tokio::test]
async fn test_contact_trigger_marks_unread() {
    let store: DocumentStoreState = Arc::new(InMemoryDocumentStore::new());
    let doc = store
        .insert(
            "contacts",
            fields(json!({ "name": "Ada", "email": "ada@example.com", "message": "Hi" })),
            Utc::now(),
        )
        .await
        .unwrap();

    let status = process_new_contact(&store, &doc).await.unwrap();
    assert_eq!(status, Some(ContactStatus::Unread));

    let stored = store.get("contacts", &doc.id).await.unwrap().unwrap();
    assert_eq!(stored.str_field("status"), Some("unread"));
    assert!(stored.str_field("processedAt").is_some());
    assert_eq!(stored.str_field("message"), Some("Hi"));
}

#[tokio::test]
async fn test_contact_trigger_marks_invalid() {
    let store: DocumentStoreState = Arc::new(InMemoryDocumentStore::new());
    // Written directly, bypassing create validation.
    let doc = store
        .insert("contacts", fields(json!({ "name": "Anon", "message": "Hi" })), Utc::now())
        .await
        .unwrap();

    let status = process_new_contact(&store, &doc).await.unwrap();
    assert_eq!(status, Some(ContactStatus::Invalid));

    let stored = store.get("contacts", &doc.id).await.unwrap().unwrap();
    assert_eq!(stored.str_field("status"), Some("invalid"));
    assert!(stored.str_field("processedAt").is_none());
}

#[tokio::test]
async fn test_contact_trigger_on_deleted_document() {
    let store: DocumentStoreState = Arc::new(InMemoryDocumentStore::new());
    let doc = store
        .insert(
            "contacts",
            fields(json!({ "name": "Ada", "email": "a@b.c", "message": "Hi" })),
            Utc::now(),
        )
        .await
        .unwrap();
    store.delete("contacts", &doc.id).await.unwrap();

    assert_eq!(process_new_contact(&store, &doc).await.unwrap(), None);
    assert!(store.get("contacts", &doc.id).await.unwrap().is_none());
}
