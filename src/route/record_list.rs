use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;

use crate::{filter, manifest, record::ContentRecord};

use super::{lock_catalog, App};

fn assign_headers(record_count: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert("x-length", record_count.into());

    headers
}

fn paginate(
    params: &HashMap<String, String>,
    records: Vec<ContentRecord>,
) -> Result<Vec<ContentRecord>, StatusCode> {
    let offset = params
        .get("offset")
        .map(|x| x.parse::<usize>())
        .transpose()
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let limit = params
        .get("limit")
        .map(|x| x.parse::<usize>())
        .transpose()
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let records = match (offset, limit) {
        (None, None) => records,
        (None, Some(limit)) => records.into_iter().take(limit).collect(),
        (Some(offset), None) => records.into_iter().skip(offset).collect(),
        (Some(offset), Some(limit)) => records.into_iter().skip(offset).take(limit).collect(),
    };
    Ok(records)
}

fn get_inner(
    params: &HashMap<String, String>,
    app: &App,
) -> Result<(HeaderMap, Vec<ContentRecord>), StatusCode> {
    let mut state = app.store.load();
    if state.validate_type(&manifest::valid_types(&state.page)) {
        // persist the healed state; the listing works either way
        if let Err(err) = app.store.save(&state) {
            tracing::warn!("failed to persist healed filter state: {err}");
        }
    }

    let catalog = lock_catalog(&app.catalog)?;

    let filtered = filter::filter(
        catalog.records(&state.page),
        &state,
        Utc::now().date_naive(),
    );
    let headers = assign_headers(filtered.len());

    let records = filtered.into_iter().cloned().collect();
    let records = paginate(params, records)?;

    Ok((headers, records))
}

/// The current page's records, narrowed by the persisted filter state,
/// newest first.
pub async fn get(
    State(app): State<App>,
    params: Query<HashMap<String, String>>,
) -> Result<(HeaderMap, Json<Vec<ContentRecord>>), StatusCode> {
    let (headers, records) = get_inner(&params, &app)?;

    Ok((headers, Json(records)))
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::paginate;

    fn records(n: usize) -> Vec<crate::record::ContentRecord> {
        (0..n)
            .map(|i| {
                let parsed = crate::frontmatter::parse("");
                crate::record::ContentRecord::from_frontmatter(
                    camino::Utf8Path::new(&format!("learn/blogs/post-{i}.md")),
                    &parsed.frontmatter,
                )
            })
            .collect()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn paginate_applies_offset_and_limit() {
        let page = paginate(&params(&[("offset", "1"), ("limit", "2")]), records(5)).unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(vec!["post-1", "post-2"], ids);
    }

    #[test]
    fn paginate_rejects_bad_params() {
        assert!(paginate(&params(&[("limit", "many")]), records(2)).is_err());
    }
}
