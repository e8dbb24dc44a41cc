use camino::Utf8Path;
use chrono::NaiveDate;
use serde::Serialize;

use crate::frontmatter::Frontmatter;

/// One parsed content item with normalized fields. `id` and `type` are
/// always non-empty; everything the metadata omits gets a default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub path: String,
    pub skill_level: String,
    pub frameworks: Vec<String>,
    pub services: Vec<String>,
    pub components: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl ContentRecord {
    #[must_use]
    pub fn from_frontmatter(path: &Utf8Path, frontmatter: &Frontmatter) -> Self {
        let (path_kind, path_slug) = source_identity(path);
        let slug = frontmatter.str("slug").unwrap_or(&path_slug).to_owned();
        let kind = frontmatter.str("type").unwrap_or(&path_kind).to_owned();

        ContentRecord {
            id: frontmatter.str("id").unwrap_or(&slug).to_owned(),
            title: frontmatter.str("title").unwrap_or("Untitled").to_owned(),
            excerpt: frontmatter
                .str("description")
                .or_else(|| frontmatter.str("excerpt"))
                .unwrap_or_default()
                .to_owned(),
            url: frontmatter.str("url").map(str::to_owned),
            image: frontmatter.str("image").map(str::to_owned),
            kind,
            date: frontmatter
                .str("date")
                .map_or_else(today, str::to_owned),
            path: path.to_string(),
            skill_level: frontmatter.str("skillLevel").unwrap_or_default().to_owned(),
            frameworks: string_list(frontmatter, "frameworks"),
            services: string_list(frontmatter, "services"),
            components: string_list(frontmatter, "components"),
            category: frontmatter.str("category").map(str::to_owned),
            industry: frontmatter.str("industry").map(str::to_owned),
            pricing: frontmatter.str("pricing").map(str::to_owned),
            company: frontmatter.str("company").map(str::to_owned),
        }
    }

    /// Date used for ordering and recency filtering. Invalid or missing
    /// dates collapse to the epoch and sort last.
    #[must_use]
    pub fn sort_date(&self) -> NaiveDate {
        parse_date(&self.date).unwrap_or_default()
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    if let Ok(date) = date.parse::<NaiveDate>() {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|dt| dt.date_naive())
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn string_list(frontmatter: &Frontmatter, key: &str) -> Vec<String> {
    frontmatter.list(key).unwrap_or_default().to_vec()
}

/// Derives (type, slug) from the source path. A flat item takes its type
/// from the parent directory and its slug from the file stem. A nested
/// single-file-per-directory item (`templates/foo/template.md`, where the
/// grandparent is the stem pluralized) takes its type from the grandparent
/// and its slug from the parent directory.
#[must_use]
pub fn source_identity(path: &Utf8Path) -> (String, String) {
    let stem = path.file_stem().unwrap_or_default();
    let parent = path
        .parent()
        .and_then(Utf8Path::file_name)
        .unwrap_or_default();
    let grandparent = path
        .parent()
        .and_then(Utf8Path::parent)
        .and_then(Utf8Path::file_name)
        .unwrap_or_default();

    if !stem.is_empty() && grandparent == format!("{stem}s") {
        (grandparent.to_owned(), parent.to_owned())
    } else if parent.is_empty() {
        ("content".to_owned(), stem.to_owned())
    } else {
        (parent.to_owned(), stem.to_owned())
    }
}
