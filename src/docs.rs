use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, Content, OpenApiBuilder, Ref, Required,
        path::{
            HttpMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn,
            PathItemBuilder, PathsBuilder,
        },
        request_body::RequestBodyBuilder,
        response::ResponseBuilder,
        schema::{ArrayBuilder, ObjectBuilder, Type},
        security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme},
    },
};

use crate::{
    handlers, models,
    resources::{Access, RESOURCES, ResourceSpec},
};

/// Name of the bearer security scheme referenced by gated operations.
const BEARER: &str = "bearer_auth";

/// ApiDoc
///
/// Static part of the OpenAPI document: the schemas, the security scheme and the
/// hand-annotated non-resource paths. The resource paths are generated from the
/// `ResourceSpec` table in `openapi()`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::create_upload),
    components(
        schemas(
            models::Project, models::NewProject,
            models::BlogPost, models::NewBlogPost,
            models::Photo, models::NewPhoto,
            models::Song, models::NewSong, models::SongKind,
            models::ContactMessage, models::NewContactMessage,
            models::ContactStatus, models::ContactStatusUpdate,
            models::UploadRequest, models::UploadResponse, models::MessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "projects", description = "Portfolio projects"),
        (name = "blogs", description = "Blog posts"),
        (name = "photos", description = "Photo gallery"),
        (name = "songs", description = "Songs and playlists"),
        (name = "contacts", description = "Contact form submissions"),
        (name = "uploads", description = "Presigned media uploads")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                BEARER,
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// openapi
///
/// The complete document served at `/api-docs/openapi.json`.
pub fn openapi() -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(resource_paths());
    doc
}

/// Describes every route the resource router factory mounts, so the document cannot
/// drift from what is actually served.
fn resource_paths() -> openapi::OpenApi {
    let mut paths = PathsBuilder::new();

    for spec in RESOURCES.iter().copied() {
        let tag = spec.collection;

        let collection = PathItemBuilder::new()
            .operation(HttpMethod::Get, list_operation(spec))
            .operation(
                HttpMethod::Post,
                operation(tag, &format!("Create a {}", spec.label), spec.create)
                    .request_body(Some(json_body(spec.create_schema)))
                    .response("201", json_response("Created", spec.schema))
                    .response("400", plain_response("Validation failed"))
                    .build(),
            );
        paths = paths.path(spec.prefix, collection.build());

        let mut item = PathItemBuilder::new();
        let mut has_item_ops = false;

        if let Some(access) = spec.get {
            item = item.operation(
                HttpMethod::Get,
                operation(tag, &format!("Get a {} by id", spec.label), access)
                    .parameter(id_parameter())
                    .response("200", json_response("Found", spec.schema))
                    .response("404", plain_response("Not found"))
                    .build(),
            );
            has_item_ops = true;
        }

        if let Some(access) = spec.update {
            item = item.operation(
                HttpMethod::Put,
                operation(tag, &format!("Partially update a {}", spec.label), access)
                    .parameter(id_parameter())
                    .request_body(Some(json_body(spec.update_schema)))
                    .response("200", plain_response("Applied fields, echoed with the id"))
                    .response("404", plain_response("Not found"))
                    .build(),
            );
            has_item_ops = true;
        }

        if let Some(access) = spec.delete {
            item = item.operation(
                HttpMethod::Delete,
                operation(tag, &format!("Delete a {}", spec.label), access)
                    .parameter(id_parameter())
                    .response("200", json_response("Deleted", "MessageResponse"))
                    .build(),
            );
            has_item_ops = true;
        }

        if has_item_ops {
            paths = paths.path(spec.item_path(), item.build());
        }
    }

    OpenApiBuilder::new().paths(paths.build()).build()
}

fn list_operation(spec: &ResourceSpec) -> Operation {
    let mut op = operation(
        spec.collection,
        &format!("List {} documents, newest first", spec.label),
        spec.list,
    )
    .response(
        "200",
        ResponseBuilder::new()
            .description("Documents")
            .content(
                "application/json",
                Content::new(Some(
                    ArrayBuilder::new()
                        .items(Ref::from_schema_name(spec.schema))
                        .build(),
                )),
            )
            .build(),
    );

    if let Some(field) = spec.list_filter {
        op = op.parameter(
            ParameterBuilder::new()
                .name(field)
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .description(Some("Exact, case-sensitive match. `All` disables the filter."))
                .schema(Some(ObjectBuilder::new().schema_type(Type::String).build())),
        );
    }

    op.build()
}

fn operation(tag: &str, summary: &str, access: Access) -> OperationBuilder {
    let op = OperationBuilder::new().tag(tag).summary(Some(summary));
    match access {
        Access::Public => op,
        Access::Gated => op
            .security(SecurityRequirement::new(BEARER, Vec::<String>::new()))
            .response("401", plain_response("Missing or invalid token")),
    }
}

fn id_parameter() -> ParameterBuilder {
    ParameterBuilder::new()
        .name("id")
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .schema(Some(ObjectBuilder::new().schema_type(Type::String).build()))
}

fn json_body(schema: &str) -> openapi::request_body::RequestBody {
    RequestBodyBuilder::new()
        .content(
            "application/json",
            Content::new(Some(Ref::from_schema_name(schema))),
        )
        .required(Some(Required::True))
        .build()
}

fn json_response(description: &str, schema: &str) -> openapi::response::Response {
    ResponseBuilder::new()
        .description(description)
        .content(
            "application/json",
            Content::new(Some(Ref::from_schema_name(schema))),
        )
        .build()
}

fn plain_response(description: &str) -> openapi::response::Response {
    ResponseBuilder::new().description(description).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mounted_route_is_documented() {
        let doc = openapi();
        for spec in RESOURCES.iter() {
            assert!(doc.paths.paths.contains_key(spec.prefix), "{}", spec.prefix);
        }
        assert!(doc.paths.paths.contains_key("/blogs/{id}"));
        assert!(doc.paths.paths.contains_key("/uploads"));
        // Songs have neither get nor update, but delete still needs an item path.
        assert!(doc.paths.paths.contains_key("/songs/{id}"));
    }

    #[test]
    fn gated_operations_declare_bearer_security() {
        let doc = openapi();
        let contacts = &doc.paths.paths["/contacts"];
        let list = contacts.get.as_ref().expect("contacts list documented");
        let submit = contacts.post.as_ref().expect("contacts create documented");
        assert!(list.security.is_some());
        assert!(submit.security.is_none());
    }
}
