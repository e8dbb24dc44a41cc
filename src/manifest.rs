use camino::{Utf8Path, Utf8PathBuf};

use crate::fs;

/// One source directory contributing to a page's catalog. Flat groups hold
/// `*.md` directly; nested groups hold one `<singular>.md` per
/// subdirectory, e.g. `templates/<slug>/template.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub dir: &'static str,
    pub nested: bool,
}

impl Group {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.dir.rsplit('/').next().unwrap_or(self.dir)
    }

    fn item_file(&self) -> String {
        format!("{}.md", self.name().trim_end_matches('s'))
    }
}

const BUILD_GROUPS: &[Group] = &[
    Group {
        dir: "build/patterns",
        nested: false,
    },
    Group {
        dir: "build/blueprints",
        nested: false,
    },
    Group {
        dir: "build/projects",
        nested: false,
    },
    Group {
        dir: "build/templates",
        nested: true,
    },
];

const LEARN_GROUPS: &[Group] = &[
    Group {
        dir: "learn/blogs",
        nested: false,
    },
    Group {
        dir: "learn/videos",
        nested: false,
    },
    Group {
        dir: "learn/workshops",
        nested: false,
    },
];

#[must_use]
pub fn page_groups(page: &str) -> &'static [Group] {
    match page {
        "build" => BUILD_GROUPS,
        "learn" => LEARN_GROUPS,
        _ => &[],
    }
}

/// The tab vocabulary for a page. A persisted `type` filter outside this
/// set is stale and gets reset to `"all"`.
#[must_use]
pub fn valid_types(page: &str) -> Vec<&'static str> {
    let mut types = vec!["all"];
    types.extend(page_groups(page).iter().map(Group::name));
    types
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Source {
    pub path: Utf8PathBuf,
}

/// A structured index of a page's source files, decoupling the catalog
/// from the discovery mechanism.
#[derive(Debug, Default)]
pub struct Manifest {
    pub sources: Vec<Source>,
}

impl Manifest {
    /// Enumerates a page's sources under `root`. Group directories that do
    /// not exist are skipped. Entries are path-ordered so that records
    /// sharing a date keep a deterministic relative order.
    pub fn scan(root: &Utf8Path, page: &str) -> Result<Self, std::io::Error> {
        let mut sources = Vec::new();
        for group in page_groups(page) {
            let dir = root.join(group.dir);
            if !dir.is_dir() {
                continue;
            }
            let paths = if group.nested {
                fs::nested_filepaths(&dir, &group.item_file())?
            } else {
                fs::filepaths_with_extensions(&dir, &["md"])?
            };
            sources.extend(paths.into_iter().map(|path| Source { path }));
        }
        sources.sort();
        Ok(Manifest { sources })
    }
}
