pub mod facet_options;
pub mod filter_state;
pub mod record_list;
pub mod record_single;

use std::sync::{Arc, MutexGuard};

use axum::http::StatusCode;
use tracing::error;

use crate::{
    catalog::{self, Catalog},
    filter::FilterState,
    markdown::Renderer,
    state::Store,
};

#[derive(Clone)]
pub struct App {
    pub catalog: catalog::ArcMutex,
    pub store: Arc<Store>,
    pub renderer: Arc<Renderer>,
}

fn lock_catalog(catalog: &catalog::ArcMutex) -> Result<MutexGuard<'_, Catalog>, StatusCode> {
    catalog.lock().map_err(|err| {
        error!("Failed to lock catalog data: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn save_state(app: &App, state: &FilterState) -> Result<(), StatusCode> {
    app.store.save(state).map_err(|err| {
        error!("Failed to persist filter state: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
