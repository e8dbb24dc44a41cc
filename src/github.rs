use camino::Utf8Path;
use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::error;

use crate::{catalog::Document, frontmatter, record::ContentRecord};

/// Remote content source: the same page layout served through the GitHub
/// contents API instead of a local directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Config {
    /// Reads `GARDENIA_GITHUB_OWNER` / `_REPO` / `_BRANCH` / `_BASE_PATH` /
    /// `_TOKEN`. Returns `None` unless owner and repo are both set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let owner = std::env::var("GARDENIA_GITHUB_OWNER").ok()?;
        let repo = std::env::var("GARDENIA_GITHUB_REPO").ok()?;
        Some(Config {
            owner,
            repo,
            branch: std::env::var("GARDENIA_GITHUB_BRANCH").unwrap_or_else(|_| "main".to_owned()),
            base_path: std::env::var("GARDENIA_GITHUB_BASE_PATH").ok(),
            token: std::env::var("GARDENIA_GITHUB_TOKEN").ok(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/contents/{}?ref={}",
            self.owner, self.repo, path, self.branch
        )
    }

    fn section_path(&self, page: &str) -> String {
        match &self.base_path {
            Some(base) => format!("{base}/{page}"),
            None => page.to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    Status(reqwest::StatusCode),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct DirEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

async fn fetch_directory(
    client: &Client,
    config: &Config,
    path: &str,
) -> Result<Vec<DirEntry>, Error> {
    let mut request = client
        .get(config.contents_url(path))
        .header("Accept", "application/vnd.github.v3+json")
        .header("User-Agent", "gardenia");
    if let Some(token) = &config.token {
        request = request.header("Authorization", format!("token {token}"));
    }
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(Error::Status(response.status()));
    }
    Ok(response.json().await?)
}

async fn fetch_file(client: &Client, url: &str) -> Result<String, Error> {
    let response = client
        .get(url)
        .header("User-Agent", "gardenia")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(Error::Status(response.status()));
    }
    Ok(response.text().await?)
}

fn build_document(path: &str, text: &str) -> Document {
    let mut parsed = frontmatter::parse(text);
    parsed.frontmatter.normalize();
    Document {
        record: ContentRecord::from_frontmatter(Utf8Path::new(path), &parsed.frontmatter),
        body: parsed.body,
    }
}

/// Loads one page's records from the remote repository. Per-directory and
/// per-file failures are logged and skipped; only the top-level listing
/// failing is fatal. File fetches fan out and the batch is awaited, then
/// sorted newest first (path as tiebreak, since completion order is
/// arbitrary).
pub async fn load(client: &Client, config: &Config, page: &str) -> Result<Vec<Document>, Error> {
    let subdirs = fetch_directory(client, config, &config.section_path(page)).await?;

    let mut tasks = JoinSet::new();
    for subdir in subdirs.into_iter().filter(|entry| entry.kind == "dir") {
        let files = match fetch_directory(client, config, &subdir.path).await {
            Ok(files) => files,
            Err(err) => {
                error!("skipping directory {}: {err}", subdir.path);
                continue;
            }
        };
        for file in files
            .into_iter()
            .filter(|file| file.kind == "file" && file.name.ends_with(".md"))
        {
            let Some(url) = file.download_url.clone() else {
                continue;
            };
            let client = client.clone();
            tasks.spawn(async move {
                match fetch_file(&client, &url).await {
                    Ok(text) => Some(build_document(&file.path, &text)),
                    Err(err) => {
                        error!("skipping file {}: {err}", file.path);
                        None
                    }
                }
            });
        }
    }

    let mut documents = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(document)) => documents.push(document),
            Ok(None) => {}
            Err(err) => error!("fetch task failed: {err}"),
        }
    }

    documents.sort_by(|a, b| {
        b.record
            .sort_date()
            .cmp(&a.record.sort_date())
            .then_with(|| a.record.path.cmp(&b.record.path))
    });

    Ok(documents)
}
