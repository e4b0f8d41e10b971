//! Document-created triggers.
//!
//! These run after the create response has been produced, on their own task, the way
//! a database-side trigger would. Clients must not assume their effects are visible
//! immediately.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::{
    models::{ContactStatus, Document, Fields},
    repository::{DocumentStoreState, StoreError},
    resources::{CONTACTS, non_empty_str},
};

/// spawn_contact_processing
///
/// Schedules `process_new_contact` for a freshly inserted contact message.
pub fn spawn_contact_processing(store: DocumentStoreState, doc: Document) {
    tokio::spawn(async move {
        if let Err(e) = process_new_contact(&store, &doc).await {
            tracing::error!(contact_id = %doc.id, "contact processing failed: {}", e);
        }
    });
}

/// process_new_contact
///
/// Classifies a submitted contact message. One without an email or a message body is
/// marked `invalid`; anything else becomes `unread` and gets a `processedAt` stamp.
/// Returns the status written, or `None` if the document vanished in the meantime.
pub async fn process_new_contact(
    store: &DocumentStoreState,
    doc: &Document,
) -> Result<Option<ContactStatus>, StoreError> {
    let mut update = Fields::new();

    let status = if non_empty_str(&doc.fields, "email").is_none()
        || non_empty_str(&doc.fields, "message").is_none()
    {
        tracing::warn!(contact_id = %doc.id, "invalid contact submission");
        ContactStatus::Invalid
    } else {
        tracing::info!(
            contact_id = %doc.id,
            "new contact message from {} <{}>",
            doc.str_field("name").unwrap_or_default(),
            doc.str_field("email").unwrap_or_default(),
        );
        update.insert(
            "processedAt".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        ContactStatus::Unread
    };

    update.insert(
        "status".to_string(),
        Value::String(status.as_str().to_string()),
    );

    let merged = store.merge(CONTACTS.collection, &doc.id, update).await?;
    Ok(merged.map(|_| status))
}
