use chrono::{TimeZone, Utc};
use portfolio_api::models::{
    ContactMessage, ContactStatus, Document, Fields, Photo, Project, Song, SongKind,
    UploadRequest,
};
use serde_json::{Value, json};

fn document(fields: Value) -> Document {
    let Value::Object(fields) = fields else {
        panic!("expected an object");
    };
    Document {
        id: "doc-1".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        fields,
    }
}

#[test]
fn test_document_flattens_fields_on_the_wire() {
    let doc = document(json!({ "title": "T", "techStack": ["Rust"] }));
    let wire = serde_json::to_value(&doc).unwrap();

    assert_eq!(wire["id"], "doc-1");
    assert_eq!(wire["createdAt"], "2024-05-01T12:00:00Z");
    assert_eq!(wire["title"], "T");
    assert!(wire.get("fields").is_none());

    let back: Document = serde_json::from_value(wire).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn test_project_view_reads_stored_document() {
    let doc = document(json!({
        "title": "Ray tracer",
        "description": "Weekend project",
        "techStack": ["Rust", "WGPU"],
        "githubUrl": "https://github.com/me/rt"
    }));

    let project: Project = serde_json::from_value(serde_json::to_value(&doc).unwrap()).unwrap();
    assert_eq!(project.id, "doc-1");
    assert_eq!(project.tech_stack, vec!["Rust", "WGPU"]);
    assert_eq!(project.live_url, None);
    assert_eq!(project.github_url.as_deref(), Some("https://github.com/me/rt"));
}

#[test]
fn test_song_kind_wire_names() {
    let doc = document(json!({ "title": "Mix", "url": "u", "type": "playlist" }));
    let song: Song = serde_json::from_value(serde_json::to_value(&doc).unwrap()).unwrap();
    assert_eq!(song.kind, SongKind::Playlist);

    // Documents written before the field existed read back as songs.
    let legacy = document(json!({ "title": "Old", "url": "u" }));
    let song: Song = serde_json::from_value(serde_json::to_value(&legacy).unwrap()).unwrap();
    assert_eq!(song.kind, SongKind::Song);
    assert_eq!(SongKind::parse("Song"), None);
}

#[test]
fn test_photo_date_is_optional() {
    let doc = document(json!({ "imageUrl": "u", "category": "Nature" }));
    let photo: Photo = serde_json::from_value(serde_json::to_value(&doc).unwrap()).unwrap();
    assert!(photo.date.is_none());
    assert_eq!(photo.category.as_deref(), Some("Nature"));
}

#[test]
fn test_contact_before_and_after_processing() {
    let pending = document(json!({ "name": "Ada", "email": "a@b.c", "message": "Hi" }));
    let contact: ContactMessage =
        serde_json::from_value(serde_json::to_value(&pending).unwrap()).unwrap();
    assert_eq!(contact.status, None);

    let mut fields: Fields = pending.fields.clone();
    fields.insert("status".into(), json!("unread"));
    fields.insert("processedAt".into(), json!("2024-05-01T12:00:01.000Z"));
    let processed = Document { fields, ..pending };

    let contact: ContactMessage =
        serde_json::from_value(serde_json::to_value(&processed).unwrap()).unwrap();
    assert_eq!(contact.status, Some(ContactStatus::Unread));
    assert!(contact.processed_at.is_some());
}

#[test]
fn test_upload_request_camel_case() {
    let req: UploadRequest = serde_json::from_value(json!({
        "filename": "moon.jpg",
        "contentType": "image/jpeg"
    }))
    .unwrap();

    assert_eq!(req.content_type, "image/jpeg");
    assert!(req.folder.is_none());
}
