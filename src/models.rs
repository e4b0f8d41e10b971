use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Stored Documents ---

/// Fields
///
/// The schema-loose body of a stored document: JSON keys as the client sent them,
/// minus anything outside the resource's allow-list.
pub type Fields = Map<String, Value>;

/// Document
///
/// One record of a resource collection as it leaves the store. `id` and `createdAt`
/// are owned by the server; every other key lives in `fields` and is flattened into
/// the JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Returns a string field, if present and a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

// --- Typed Resource Views ---
//
// The gateway stores and returns `Document`s. These typed views describe the same
// JSON for the OpenAPI document, the generated TypeScript bindings, and clients that
// want to deserialize responses.

/// Project
///
/// A portfolio project card (`projects` collection).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    // Ordered; rendered as badges in the order given.
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub live_url: Option<String>,
    /// Link to the source repository.
    pub github_url: Option<String>,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// BlogPost
///
/// A long-form article (`blogs` collection).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Photo
///
/// A gallery entry (`photos` collection). `category` is free text; the gallery groups
/// by whatever values the operator invents.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Photo {
    pub id: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub caption: Option<String>,
    /// When the photo was taken.
    #[ts(type = "string | null")]
    pub date: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// SongKind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SongKind {
    #[default]
    Song,
    Playlist,
}

impl SongKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SongKind::Song => "song",
            SongKind::Playlist => "playlist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "song" => Some(SongKind::Song),
            "playlist" => Some(SongKind::Playlist),
            _ => None,
        }
    }
}

/// Song
///
/// A song or playlist link (`songs` collection). `url` is stored exactly as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Song {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: SongKind,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ContactStatus
///
/// Set by the contact trigger after submission, then moved to `Read` by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContactStatus {
    Unread,
    Read,
    Invalid,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Unread => "unread",
            ContactStatus::Read => "read",
            ContactStatus::Invalid => "invalid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unread" => Some(ContactStatus::Unread),
            "read" => Some(ContactStatus::Read),
            "invalid" => Some(ContactStatus::Invalid),
            _ => None,
        }
    }
}

/// ContactMessage
///
/// A public contact-form submission (`contacts` collection). `status` is absent until
/// the contact trigger has processed the document.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: Option<ContactStatus>,
    #[ts(type = "string | null")]
    pub processed_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// NewProject
///
/// Body of `POST /projects`. Every field is optional for `PUT /projects/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub live_url: Option<String>,
    pub github_url: Option<String>,
    pub image_url: Option<String>,
}

/// NewBlogPost
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
}

/// NewPhoto
///
/// `date` accepts RFC 3339 or `YYYY-MM-DD` and defaults to the upload instant.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPhoto {
    pub image_url: String,
    pub category: String,
    pub caption: Option<String>,
    #[schema(example = "2024-03-14")]
    pub date: Option<String>,
}

/// NewSong
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewSong {
    pub title: String,
    #[schema(example = "https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<SongKind>,
}

/// NewContactMessage
///
/// Body of the public `POST /contacts`. All three fields must be non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// ContactStatusUpdate
///
/// Body of `PUT /contacts/{id}`: the operator marking a message as read.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactStatusUpdate {
    pub status: ContactStatus,
}

/// UploadRequest
///
/// Input payload for `POST /uploads`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UploadRequest {
    #[schema(example = "moon.jpg")]
    pub filename: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    /// Top-level key prefix; defaults to `uploads`.
    #[schema(example = "photos")]
    pub folder: Option<String>,
}

// --- Responses ---

/// UploadResponse
///
/// The client PUTs the file bytes to `uploadUrl`, then stores `publicUrl` on a document.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UploadResponse {
    pub upload_url: String,
    pub object_key: String,
    pub public_url: String,
}

/// MessageResponse
///
/// Plain acknowledgement returned by deletes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
