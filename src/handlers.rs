use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{Document, Fields, MessageResponse, UploadRequest, UploadResponse},
    repository::{DocumentStoreState, FieldFilter},
    resources::ResourceSpec,
    storage::{ObjectStoreState, sanitize_key},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;

// --- Generic Resource Handlers ---
//
// One implementation per CRUD operation, parametrized by the collection's
// `ResourceSpec`. The router factory binds each to a spec and decides whether the
// auth gate wraps it; none of these functions know about authentication.

/// list_documents
///
/// Every document in the collection, newest first. If the resource has a filter field
/// and the query carries a non-empty value for it (other than `All`), only exact
/// matches are returned.
pub async fn list_documents(
    spec: &'static ResourceSpec,
    store: DocumentStoreState,
    query: HashMap<String, String>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = spec.list_filter.and_then(|field| {
        query
            .get(field)
            .filter(|value| !value.is_empty() && value.as_str() != "All")
            .map(|value| FieldFilter::new(field, value.as_str()))
    });

    let docs = store.list(spec.collection, filter.as_ref()).await?;
    Ok(Json(docs))
}

/// get_document
pub async fn get_document(
    spec: &'static ResourceSpec,
    store: DocumentStoreState,
    id: String,
) -> ApiResult<Json<Document>> {
    store
        .get(spec.collection, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("{} not found", spec.label)))
}

/// create_document
///
/// Allow-lists the body, runs the create hook, stamps `createdAt` and inserts.
/// The after-create trigger, if any, is fired without waiting on it.
pub async fn create_document(
    spec: &'static ResourceSpec,
    store: DocumentStoreState,
    body: Fields,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let now = Utc::now();
    let mut fields = ResourceSpec::allow_listed(body, spec.create_fields);
    (spec.validate_create)(&mut fields, now)?;

    let doc = store.insert(spec.collection, fields, now).await?;
    tracing::info!(collection = spec.collection, id = %doc.id, "document created");

    if let Some(trigger) = spec.after_create {
        trigger(store.clone(), doc.clone());
    }

    Ok((StatusCode::CREATED, Json(doc)))
}

/// update_document
///
/// Merges the allow-listed partial body into the stored document. Fields not in the
/// body are left as they are. A missing id is a 404 and nothing is written.
///
/// Responds with the id and the fields that were applied, not the whole document.
pub async fn update_document(
    spec: &'static ResourceSpec,
    store: DocumentStoreState,
    id: String,
    body: Fields,
) -> ApiResult<Json<Fields>> {
    let mut fields = ResourceSpec::allow_listed(body, spec.update_fields);
    (spec.validate_update)(&mut fields)?;

    let mut echoed = Fields::new();
    echoed.insert("id".to_string(), Value::String(id.clone()));
    echoed.extend(fields.clone());

    match store.merge(spec.collection, &id, fields).await? {
        Some(_) => {
            tracing::info!(collection = spec.collection, id = %id, "document updated");
            Ok(Json(echoed))
        }
        None => Err(ApiError::not_found(format!("{} not found", spec.label))),
    }
}

/// delete_document
///
/// Hard delete. Deleting an id that does not exist succeeds the same way.
pub async fn delete_document(
    spec: &'static ResourceSpec,
    store: DocumentStoreState,
    id: String,
) -> ApiResult<Json<MessageResponse>> {
    let removed = store.delete(spec.collection, &id).await?;
    tracing::info!(collection = spec.collection, id = %id, removed, "document deleted");

    Ok(Json(MessageResponse {
        message: format!("{} deleted successfully", spec.label),
    }))
}

// --- Uploads ---

/// create_upload
///
/// [Authenticated Route] Issues a presigned upload for one media file. The object key
/// is `<folder>/<unix-millis>_<filename>`, with traversal segments stripped from both
/// parts. Bytes go straight from the client to object storage.
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "uploads",
    request_body = UploadRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Presigned upload", body = UploadResponse),
        (status = 400, description = "Missing filename or content type"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_upload(
    AuthUser { uid, .. }: AuthUser,
    State(storage): State<ObjectStoreState>,
    Json(payload): Json<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    let filename = sanitize_key(&payload.filename).replace('/', "_");
    if filename.is_empty() || payload.content_type.trim().is_empty() {
        return Err(ApiError::bad_request("filename and contentType are required"));
    }

    let folder = payload
        .folder
        .as_deref()
        .map(sanitize_key)
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| "uploads".to_string());

    let object_key = format!(
        "{}/{}_{}",
        folder,
        Utc::now().timestamp_millis(),
        filename
    );

    let presigned = storage
        .presign_upload(&object_key, payload.content_type.trim())
        .await?;

    tracing::info!(uid = %uid, key = %object_key, "presigned upload issued");

    Ok(Json(UploadResponse {
        upload_url: presigned.upload_url,
        object_key,
        public_url: presigned.public_url,
    }))
}
