use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use axum::{routing, Router};
use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecursiveMode, Watcher};
use tracing::{info, warn};

use gardenia::{
    catalog::{self, Catalog},
    github, manifest,
    markdown::Renderer,
    route,
    state::Store,
};

async fn load_remote_catalog(config: &github::Config) -> Result<Catalog> {
    info!(
        "loading content from github.com/{}/{}@{}",
        config.owner, config.repo, config.branch
    );
    let client = reqwest::Client::new();
    let mut pages = HashMap::new();
    for page in catalog::PAGES {
        let documents = github::load(&client, config, page).await?;
        pages.insert((*page).to_owned(), documents);
    }
    Ok(Catalog::from_pages(pages))
}

fn watch_content(
    content_root: &Utf8Path,
    catalog: catalog::ArcMutex,
) -> Result<notify::RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(catalog)?;
    watcher.watch(content_root.as_std_path(), RecursiveMode::Recursive)?;
    Ok(watcher)
}

async fn run() -> Result<()> {
    let mut args = std::env::args();
    let port = args
        .nth(1)
        .ok_or_else(|| anyhow!("Expected a port number as a first argument"))?;
    let content_root = match args.next() {
        Some(dir) => Utf8PathBuf::from(dir),
        None => Utf8PathBuf::try_from(std::env::current_dir()?)?,
    };
    let state_dir = args
        .next()
        .map_or_else(|| content_root.clone(), Utf8PathBuf::from);

    let github_config = github::Config::from_env();
    let catalog = match &github_config {
        Some(config) => load_remote_catalog(config).await?,
        None => Catalog::load(&content_root)?,
    };
    let catalog = catalog::ArcMutex::new(catalog);

    let store = Arc::new(Store::new(&state_dir));
    let mut state = store.load();
    if state.validate_type(&manifest::valid_types(&state.page)) {
        if let Err(err) = store.save(&state) {
            warn!("failed to persist validated filter state: {err}");
        }
    }

    // kept alive for the lifetime of the server
    let _watcher = match github_config {
        Some(_) => None,
        None => Some(watch_content(&content_root, catalog.clone())?),
    };

    let app = route::App {
        catalog,
        store,
        renderer: Arc::new(Renderer::default()),
    };

    let router = Router::new()
        .route("/records/list", routing::get(route::record_list::get))
        .route("/records/:id", routing::get(route::record_single::get))
        .route("/facets", routing::get(route::facet_options::get))
        .route(
            "/filters",
            routing::get(route::filter_state::get).put(route::filter_state::put),
        )
        .route("/filters/clear", routing::post(route::filter_state::clear))
        .with_state(app);

    let socket_addr_string = format!("0.0.0.0:{port}");
    info!("Binding to {socket_addr_string}");
    axum::Server::bind(&socket_addr_string.parse()?)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
