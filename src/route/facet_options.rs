use axum::{extract::State, http::StatusCode, Json};

use crate::facets::{self, FacetOptions};

use super::{lock_catalog, App};

/// Facet options for the persisted page: presets merged with values
/// discovered in the loaded records.
pub async fn get(State(app): State<App>) -> Result<Json<FacetOptions>, StatusCode> {
    let state = app.store.load();
    let catalog = lock_catalog(&app.catalog)?;

    let records: Vec<_> = catalog.records(&state.page).collect();

    Ok(Json(facets::available(&records)))
}
