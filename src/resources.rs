//! The five portfolio collections, described as data.
//!
//! Every collection gets the same list/get/create/update/delete behavior from the
//! router factory in `routes::resources`. What differs per collection lives in its
//! `ResourceSpec`: the allow-lists, which operations exist, which are gated, and the
//! validation hooks.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{ContactStatus, Document, Fields, SongKind},
    repository::DocumentStoreState,
    triggers,
};

/// Access
///
/// Whether an operation is open to anyone or sits behind the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Gated,
}

/// Runs on the allow-listed body of a create, before `createdAt` is stamped. May
/// reject the request or fill in defaults.
pub type CreateHook = fn(&mut Fields, DateTime<Utc>) -> Result<(), ApiError>;

/// Runs on the allow-listed body of an update.
pub type UpdateHook = fn(&mut Fields) -> Result<(), ApiError>;

/// Fired after a successful insert. Must not block the response.
pub type AfterCreate = fn(DocumentStoreState, Document);

/// ResourceSpec
///
/// Everything the generic CRUD router needs to serve one collection.
pub struct ResourceSpec {
    /// Document store collection name.
    pub collection: &'static str,
    /// Route prefix, e.g. `/projects`.
    pub prefix: &'static str,
    /// Singular noun used in response messages.
    pub label: &'static str,
    /// Schema names used by the generated OpenAPI paths.
    pub schema: &'static str,
    pub create_schema: &'static str,
    pub update_schema: &'static str,

    pub create_fields: &'static [&'static str],
    pub update_fields: &'static [&'static str],
    /// The one field `GET <prefix>?<field>=` may filter on.
    pub list_filter: Option<&'static str>,

    pub list: Access,
    pub get: Option<Access>,
    pub create: Access,
    pub update: Option<Access>,
    pub delete: Option<Access>,

    pub validate_create: CreateHook,
    pub validate_update: UpdateHook,
    pub after_create: Option<AfterCreate>,
}

impl ResourceSpec {
    pub fn item_path(&self) -> String {
        format!("{}/{{id}}", self.prefix)
    }

    /// Keeps only the keys in `allow`. `id` and `createdAt` are never on a list, so
    /// clients cannot overwrite them.
    pub fn allow_listed(body: Fields, allow: &[&str]) -> Fields {
        body.into_iter()
            .filter(|(key, _)| allow.contains(&key.as_str()))
            .collect()
    }
}

pub static PROJECTS: ResourceSpec = ResourceSpec {
    collection: "projects",
    prefix: "/projects",
    label: "Project",
    schema: "Project",
    create_schema: "NewProject",
    update_schema: "NewProject",
    create_fields: &[
        "title",
        "description",
        "techStack",
        "liveUrl",
        "githubUrl",
        "imageUrl",
    ],
    update_fields: &[
        "title",
        "description",
        "techStack",
        "liveUrl",
        "githubUrl",
        "imageUrl",
    ],
    list_filter: None,
    list: Access::Public,
    get: None,
    create: Access::Gated,
    update: Some(Access::Gated),
    delete: Some(Access::Gated),
    validate_create: validate_project,
    validate_update: validate_project_update,
    after_create: None,
};

pub static BLOGS: ResourceSpec = ResourceSpec {
    collection: "blogs",
    prefix: "/blogs",
    label: "Blog",
    schema: "BlogPost",
    create_schema: "NewBlogPost",
    update_schema: "NewBlogPost",
    create_fields: &["title", "content", "coverImage"],
    update_fields: &["title", "content", "coverImage"],
    list_filter: None,
    list: Access::Public,
    get: Some(Access::Public),
    create: Access::Gated,
    update: Some(Access::Gated),
    delete: Some(Access::Gated),
    validate_create: no_create_checks,
    validate_update: no_update_checks,
    after_create: None,
};

pub static PHOTOS: ResourceSpec = ResourceSpec {
    collection: "photos",
    prefix: "/photos",
    label: "Photo",
    schema: "Photo",
    create_schema: "NewPhoto",
    update_schema: "NewPhoto",
    create_fields: &["imageUrl", "category", "caption", "date"],
    update_fields: &[],
    list_filter: Some("category"),
    list: Access::Public,
    get: None,
    create: Access::Gated,
    update: None,
    delete: Some(Access::Gated),
    validate_create: validate_photo,
    validate_update: no_update_checks,
    after_create: None,
};

pub static SONGS: ResourceSpec = ResourceSpec {
    collection: "songs",
    prefix: "/songs",
    label: "Song",
    schema: "Song",
    create_schema: "NewSong",
    update_schema: "NewSong",
    create_fields: &["title", "url", "type"],
    update_fields: &[],
    list_filter: None,
    list: Access::Public,
    get: None,
    create: Access::Gated,
    update: None,
    delete: Some(Access::Gated),
    validate_create: validate_song,
    validate_update: no_update_checks,
    after_create: None,
};

/// Contacts invert the usual gating: anyone may submit, only the operator may read.
pub static CONTACTS: ResourceSpec = ResourceSpec {
    collection: "contacts",
    prefix: "/contacts",
    label: "Contact",
    schema: "ContactMessage",
    create_schema: "NewContactMessage",
    update_schema: "ContactStatusUpdate",
    create_fields: &["name", "email", "message"],
    update_fields: &["status"],
    list_filter: None,
    list: Access::Gated,
    get: None,
    create: Access::Public,
    update: Some(Access::Gated),
    delete: Some(Access::Gated),
    validate_create: validate_contact,
    validate_update: validate_contact_update,
    after_create: Some(triggers::spawn_contact_processing),
};

/// Every collection the gateway serves, in mount order.
pub static RESOURCES: [&ResourceSpec; 5] = [&PROJECTS, &BLOGS, &PHOTOS, &SONGS, &CONTACTS];

// --- Validation Hooks ---

/// Returns the trimmed string at `key` when it is a non-empty string.
pub fn non_empty_str<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn no_create_checks(_fields: &mut Fields, _now: DateTime<Utc>) -> Result<(), ApiError> {
    Ok(())
}

fn no_update_checks(_fields: &mut Fields) -> Result<(), ApiError> {
    Ok(())
}

fn validate_project(fields: &mut Fields, _now: DateTime<Utc>) -> Result<(), ApiError> {
    if non_empty_str(fields, "title").is_none() || non_empty_str(fields, "description").is_none()
    {
        return Err(ApiError::bad_request("title and description are required"));
    }

    if !fields.contains_key("techStack") {
        fields.insert("techStack".to_string(), Value::Array(vec![]));
    }
    normalize_tech_stack(fields)
}

/// Partial updates may omit `techStack`, but one that is sent keeps the list shape.
fn validate_project_update(fields: &mut Fields) -> Result<(), ApiError> {
    if fields.contains_key("techStack") {
        normalize_tech_stack(fields)?;
    }
    Ok(())
}

fn normalize_tech_stack(fields: &mut Fields) -> Result<(), ApiError> {
    match fields.get("techStack") {
        Some(Value::Null) => {
            fields.insert("techStack".to_string(), Value::Array(vec![]));
            Ok(())
        }
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => Ok(()),
        _ => Err(ApiError::bad_request("techStack must be a list of strings")),
    }
}

/// `url` is deliberately left untouched; embed conversion is a client concern.
fn validate_song(fields: &mut Fields, _now: DateTime<Utc>) -> Result<(), ApiError> {
    let kind = match fields.get("type") {
        None | Some(Value::Null) => SongKind::Song,
        Some(Value::String(s)) => SongKind::parse(s)
            .ok_or_else(|| ApiError::bad_request("type must be 'song' or 'playlist'"))?,
        Some(_) => return Err(ApiError::bad_request("type must be 'song' or 'playlist'")),
    };

    fields.insert("type".to_string(), Value::String(kind.as_str().to_string()));
    Ok(())
}

fn validate_photo(fields: &mut Fields, now: DateTime<Utc>) -> Result<(), ApiError> {
    let date = match fields.get("date") {
        None | Some(Value::Null) => now,
        Some(Value::String(s)) if s.trim().is_empty() => now,
        Some(Value::String(s)) => parse_capture_date(s)
            .ok_or_else(|| ApiError::bad_request("date must be RFC 3339 or YYYY-MM-DD"))?,
        Some(_) => return Err(ApiError::bad_request("date must be a string")),
    };

    fields.insert(
        "date".to_string(),
        Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Ok(())
}

/// parse_capture_date
///
/// Accepts a full RFC 3339 timestamp or a bare calendar date (midnight UTC).
pub fn parse_capture_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn validate_contact(fields: &mut Fields, _now: DateTime<Utc>) -> Result<(), ApiError> {
    let complete = ["name", "email", "message"]
        .iter()
        .all(|key| non_empty_str(fields, key).is_some());

    if !complete {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    Ok(())
}

fn validate_contact_update(fields: &mut Fields) -> Result<(), ApiError> {
    match fields.get("status").and_then(Value::as_str) {
        Some(s) if ContactStatus::parse(s).is_some() => Ok(()),
        _ => Err(ApiError::bad_request(
            "status must be one of 'unread', 'read' or 'invalid'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn allow_list_drops_server_owned_and_unknown_keys() {
        let body = fields(json!({
            "title": "T", "id": "forged", "createdAt": "1999-01-01T00:00:00Z", "likes": 9
        }));
        let kept = ResourceSpec::allow_listed(body, PROJECTS.create_fields);
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("title"));
    }

    #[test]
    fn project_requires_title_and_description() {
        let mut f = fields(json!({ "title": "Only title" }));
        assert!(validate_project(&mut f, Utc::now()).is_err());

        let mut f = fields(json!({ "title": "  ", "description": "d" }));
        assert!(validate_project(&mut f, Utc::now()).is_err());
    }

    #[test]
    fn project_tech_stack_defaults_to_empty_list() {
        let mut f = fields(json!({ "title": "T", "description": "D" }));
        validate_project(&mut f, Utc::now()).unwrap();
        assert_eq!(f["techStack"], json!([]));
    }

    #[test]
    fn project_update_keeps_tech_stack_a_list() {
        let mut f = fields(json!({ "techStack": "Rust" }));
        assert!(validate_project_update(&mut f).is_err());

        let mut f = fields(json!({ "techStack": ["Rust", 7] }));
        assert!(validate_project_update(&mut f).is_err());

        let mut f = fields(json!({ "techStack": null }));
        validate_project_update(&mut f).unwrap();
        assert_eq!(f["techStack"], json!([]));

        // Omitted means untouched, not reset.
        let mut f = fields(json!({ "title": "Renamed" }));
        validate_project_update(&mut f).unwrap();
        assert!(!f.contains_key("techStack"));
    }

    #[test]
    fn song_kind_defaults_and_rejects_unknown() {
        let mut f = fields(json!({ "title": "x", "url": "u" }));
        validate_song(&mut f, Utc::now()).unwrap();
        assert_eq!(f["type"], json!("song"));

        let mut f = fields(json!({ "type": "album" }));
        assert!(validate_song(&mut f, Utc::now()).is_err());
    }

    #[test]
    fn photo_date_is_normalized() {
        let mut f = fields(json!({ "date": "2024-03-14" }));
        validate_photo(&mut f, Utc::now()).unwrap();
        assert_eq!(f["date"], json!("2024-03-14T00:00:00.000Z"));

        let mut f = fields(json!({ "date": "last tuesday" }));
        assert!(validate_photo(&mut f, Utc::now()).is_err());
    }

    #[test]
    fn contact_update_only_accepts_known_statuses() {
        let mut f = fields(json!({ "status": "read" }));
        assert!(validate_contact_update(&mut f).is_ok());

        let mut f = fields(json!({ "status": "archived" }));
        assert!(validate_contact_update(&mut f).is_err());

        let mut f = fields(json!({}));
        assert!(validate_contact_update(&mut f).is_err());
    }
}
