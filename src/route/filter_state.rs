use axum::{extract::State, http::StatusCode, Json};

use crate::{filter::FilterState, manifest};

use super::{save_state, App};

pub async fn get(State(app): State<App>) -> Json<FilterState> {
    Json(app.store.load())
}

/// Replaces the persisted state. The tab selection is validated against
/// the submitted page's vocabulary before saving.
pub async fn put(
    State(app): State<App>,
    Json(mut state): Json<FilterState>,
) -> Result<Json<FilterState>, StatusCode> {
    state.validate_type(&manifest::valid_types(&state.page));
    save_state(&app, &state)?;

    Ok(Json(state))
}

/// Resets every filter but keeps the page.
pub async fn clear(State(app): State<App>) -> Result<Json<FilterState>, StatusCode> {
    let mut state = app.store.load();
    state.clear();
    save_state(&app, &state)?;

    Ok(Json(state))
}
