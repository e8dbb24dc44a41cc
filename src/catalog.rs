use std::{
    collections::HashMap,
    sync::{Arc, LockResult, Mutex, MutexGuard},
};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, error};

use crate::{frontmatter, fs::path_has_extensions, manifest::Manifest, record::ContentRecord};

/// The pages the catalog serves. Each holds an independent, date-sorted
/// collection.
pub const PAGES: &[&str] = &["build", "learn"];

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub record: ContentRecord,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Catalog {
    root: Option<Utf8PathBuf>,
    pages: HashMap<String, Vec<Document>>,
}

impl Catalog {
    /// Loads every page's sources from a local content root. A single
    /// source failing to read or parse is logged and dropped; only failing
    /// to enumerate sources at all is an error.
    pub fn load(root: &Utf8Path) -> Result<Self, LoadError> {
        let mut pages = HashMap::new();
        for page in PAGES {
            pages.insert((*page).to_owned(), load_page(root, page)?);
        }
        Ok(Catalog {
            root: Some(root.to_owned()),
            pages,
        })
    }

    /// Wraps documents fetched elsewhere (the remote loader); such a
    /// catalog has no root to reload from.
    #[must_use]
    pub fn from_pages(mut pages: HashMap<String, Vec<Document>>) -> Self {
        for documents in pages.values_mut() {
            sort_by_date(documents);
        }
        Catalog { root: None, pages }
    }

    pub fn reload(&mut self) {
        let Some(root) = self.root.clone() else {
            debug!("catalog has no local root; ignoring reload");
            return;
        };
        for page in PAGES {
            match load_page(&root, page) {
                Ok(documents) => {
                    self.pages.insert((*page).to_owned(), documents);
                }
                Err(err) => error!("failed to reload page {page}: {err}"),
            }
        }
    }

    #[must_use]
    pub fn documents(&self, page: &str) -> &[Document] {
        self.pages.get(page).map_or(&[], Vec::as_slice)
    }

    pub fn records<'a>(&'a self, page: &str) -> impl Iterator<Item = &'a ContentRecord> {
        self.documents(page).iter().map(|document| &document.record)
    }

    #[must_use]
    pub fn count(&self, page: &str) -> usize {
        self.documents(page).len()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Document> {
        self.pages
            .values()
            .flatten()
            .find(|document| document.record.id == id)
    }
}

fn load_page(root: &Utf8Path, page: &str) -> Result<Vec<Document>, LoadError> {
    let manifest = Manifest::scan(root, page)?;
    let mut documents = Vec::with_capacity(manifest.sources.len());
    for source in &manifest.sources {
        match read_document(&source.path) {
            Ok(document) => documents.push(document),
            Err(err) => error!("skipping {}: {err}", source.path),
        }
    }
    sort_by_date(&mut documents);
    Ok(documents)
}

fn read_document(path: &Utf8Path) -> Result<Document, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    let mut parsed = frontmatter::parse(&text);
    if let Some(note) = &parsed.error {
        debug!("{path}: {note}");
    }
    parsed.frontmatter.normalize();
    Ok(Document {
        record: ContentRecord::from_frontmatter(path, &parsed.frontmatter),
        body: parsed.body,
    })
}

/// Newest first; the sort is stable, so records sharing a date keep their
/// manifest order.
fn sort_by_date(documents: &mut [Document]) {
    documents.sort_by(|a, b| b.record.sort_date().cmp(&a.record.sort_date()));
}

#[derive(Clone)]
pub struct ArcMutex(pub Arc<Mutex<Catalog>>);

impl ArcMutex {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self(Arc::new(Mutex::new(catalog)))
    }

    pub fn lock(&self) -> LockResult<MutexGuard<'_, Catalog>> {
        self.0.as_ref().lock()
    }
}

fn is_content_event(kind: notify::EventKind) -> bool {
    use notify::event::{CreateKind, DataChange, EventKind, ModifyKind, RemoveKind, RenameMode};
    matches!(
        kind,
        EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(DataChange::Content | DataChange::Any))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Any))
            | EventKind::Remove(RemoveKind::File)
    )
}

impl notify::EventHandler for ArcMutex {
    fn handle_event(&mut self, event: notify::Result<notify::Event>) {
        match event {
            Ok(notify::Event {
                kind,
                paths,
                attrs: _,
            }) => {
                let Some(path) = paths.first() else {
                    return;
                };
                let path = match Utf8PathBuf::try_from(path.clone()) {
                    Ok(path) => path,
                    Err(err) => {
                        error!("Event filepath was not UTF-8: {err}\n\nNon-UTF-8 paths not supported.");
                        return;
                    }
                };
                if !path_has_extensions(&path, &["md"]) {
                    return;
                }
                if !is_content_event(kind) {
                    return;
                }
                match self.lock() {
                    Ok(mut catalog) => catalog.reload(),
                    Err(err) => error!("Failed to lock catalog during notify event: {err}"),
                }
            }
            Err(e) => error!("watch error: {e:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use camino::Utf8Path;
    use pretty_assertions::assert_eq;

    use super::Catalog;

    fn write(root: &Utf8Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn seeded_root(tmp: &tempfile::TempDir) -> &Utf8Path {
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        write(
            root,
            "learn/blogs/old-post.md",
            "---\ntitle: Old Post\ndate: 2024-01-01\n---\nBody",
        );
        write(
            root,
            "learn/videos/new-video.md",
            "---\ntitle: New Video\ndate: 2024-06-01\n---\nBody",
        );
        write(
            root,
            "learn/workshops/undated.md",
            "---\ntitle: Undated\ndate: not-a-date\n---\nBody",
        );
        write(
            root,
            "build/templates/rag-starter/template.md",
            "---\ntitle: RAG Starter\ndate: 2024-03-01\n---\nBody",
        );
        root
    }

    #[test]
    fn loads_and_sorts_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(seeded_root(&tmp)).unwrap();

        let titles: Vec<_> = catalog
            .records("learn")
            .map(|record| record.title.as_str())
            .collect();
        assert_eq!(vec!["New Video", "Old Post", "Undated"], titles);
    }

    #[test]
    fn nested_templates_join_the_build_page() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(seeded_root(&tmp)).unwrap();

        assert_eq!(1, catalog.count("build"));
        let record = catalog.records("build").next().unwrap();
        assert_eq!("templates", record.kind);
        assert_eq!("rag-starter", record.id);
    }

    #[test]
    fn equal_dates_keep_manifest_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        write(root, "learn/blogs/a.md", "---\ndate: 2024-05-05\n---\n");
        write(root, "learn/blogs/b.md", "---\ndate: 2024-05-05\n---\n");
        write(root, "learn/blogs/c.md", "---\ndate: 2024-05-05\n---\n");

        let catalog = Catalog::load(root).unwrap();
        let ids: Vec<_> = catalog.records("learn").map(|r| r.id.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], ids);
    }

    #[test]
    fn unreadable_source_is_dropped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(tmp.path()).unwrap();
        write(root, "learn/blogs/good.md", "---\ntitle: Good\n---\nBody");
        // not UTF-8, so read_to_string fails for this source only
        std::fs::write(root.join("learn/blogs/bad.md"), [0xffu8, 0xfe, 0x00]).unwrap();

        let catalog = Catalog::load(root).unwrap();
        let titles: Vec<_> = catalog.records("learn").map(|r| r.title.as_str()).collect();
        assert_eq!(vec!["Good"], titles);
    }

    #[test]
    fn find_searches_every_page() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(seeded_root(&tmp)).unwrap();

        assert_eq!(
            "RAG Starter",
            catalog.find("rag-starter").unwrap().record.title
        );
        assert_eq!("Old Post", catalog.find("old-post").unwrap().record.title);
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn reload_picks_up_new_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let root = seeded_root(&tmp);
        let mut catalog = Catalog::load(root).unwrap();
        assert_eq!(3, catalog.count("learn"));

        write(
            root,
            "learn/blogs/brand-new.md",
            "---\ntitle: Brand New\ndate: 2025-01-01\n---\nBody",
        );
        catalog.reload();

        assert_eq!(4, catalog.count("learn"));
        assert_eq!(
            "Brand New",
            catalog.records("learn").next().unwrap().title
        );
    }
}
