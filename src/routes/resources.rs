use crate::{
    AppState, auth_middleware, handlers,
    models::Fields,
    repository::DocumentStoreState,
    resources::{Access, ResourceSpec},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{MethodRouter, delete, get, post, put},
};
use std::collections::HashMap;

/// Resource Router Factory
///
/// Builds the full router for one collection from its `ResourceSpec`. Each operation
/// it declares is mounted on either the public or the gated side; the gated side
/// is wrapped in the auth gate before the two are merged, so a gated handler can never
/// run without a verified identity.
///
/// Routes mounted:
/// - `GET    <prefix>`       list (optional `?<filter>=`)
/// - `GET    <prefix>/{id}`  get by id
/// - `POST   <prefix>`       create
/// - `PUT    <prefix>/{id}`  partial update
/// - `DELETE <prefix>/{id}`  delete
pub fn resource_router(spec: &'static ResourceSpec, state: &AppState) -> Router<AppState> {
    let mut routes = SplitRouter::default();
    let collection_path = spec.prefix;
    let item_path = spec.item_path();

    routes.mount(
        spec.list,
        collection_path,
        get(
            move |State(store): State<DocumentStoreState>,
                  Query(query): Query<HashMap<String, String>>| {
                handlers::list_documents(spec, store, query)
            },
        ),
    );

    if let Some(access) = spec.get {
        routes.mount(
            access,
            &item_path,
            get(
                move |State(store): State<DocumentStoreState>, Path(id): Path<String>| {
                    handlers::get_document(spec, store, id)
                },
            ),
        );
    }

    routes.mount(
        spec.create,
        collection_path,
        post(
            move |State(store): State<DocumentStoreState>, Json(body): Json<Fields>| {
                handlers::create_document(spec, store, body)
            },
        ),
    );

    if let Some(access) = spec.update {
        routes.mount(
            access,
            &item_path,
            put(
                move |State(store): State<DocumentStoreState>,
                      Path(id): Path<String>,
                      Json(body): Json<Fields>| {
                    handlers::update_document(spec, store, id, body)
                },
            ),
        );
    }

    if let Some(access) = spec.delete {
        routes.mount(
            access,
            &item_path,
            delete(
                move |State(store): State<DocumentStoreState>, Path(id): Path<String>| {
                    handlers::delete_document(spec, store, id)
                },
            ),
        );
    }

    routes.finish(state)
}

/// Accumulates public and gated routes separately until the auth gate is applied.
#[derive(Default)]
struct SplitRouter {
    public: Router<AppState>,
    gated: Router<AppState>,
    has_gated: bool,
}

impl SplitRouter {
    fn mount(&mut self, access: Access, path: &str, route: MethodRouter<AppState>) {
        match access {
            Access::Public => {
                self.public = std::mem::take(&mut self.public).route(path, route);
            }
            Access::Gated => {
                self.gated = std::mem::take(&mut self.gated).route(path, route);
                self.has_gated = true;
            }
        }
    }

    fn finish(self, state: &AppState) -> Router<AppState> {
        if !self.has_gated {
            return self.public;
        }

        // route_layer keeps unmatched paths as 404s instead of 401s.
        self.public.merge(self.gated.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )))
    }
}
