use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use camino::Utf8Path;
use serde::Serialize;

use crate::{
    markdown::ContentKind,
    record::{self, ContentRecord},
};

use super::{lock_catalog, App};

#[derive(Serialize)]
#[cfg_attr(debug_assertions, derive(Debug))]
pub struct Response {
    pub record: ContentRecord,
    pub html: String,
}

fn content_kind(record: &ContentRecord) -> ContentKind {
    match record.kind.as_str() {
        "patterns" => ContentKind::Pattern,
        _ => ContentKind::Blueprint,
    }
}

/// One record by id, with its body rendered to HTML. The record's slug
/// gives the renderer its image-path context.
pub async fn get(
    State(app): State<App>,
    Path(id): Path<String>,
) -> Result<Json<Response>, StatusCode> {
    let catalog = lock_catalog(&app.catalog)?;

    let document = catalog.find(&id).ok_or(StatusCode::NOT_FOUND)?;
    let (_, slug) = record::source_identity(Utf8Path::new(&document.record.path));

    let html = app.renderer.render(
        &document.body,
        Some(&slug),
        content_kind(&document.record),
    );

    Ok(Json(Response {
        record: document.record.clone(),
        html,
    }))
}
