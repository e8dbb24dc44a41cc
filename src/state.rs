use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;

use crate::filter::FilterState;

/// File name of the durable filter-state record.
pub const STATE_FILE: &str = "content-filter-state.json";

/// Owns the durable copy of the filter state. All reads and writes go
/// through this explicit load/save boundary; last-write-wins is fine since
/// there is a single logical owner.
pub struct Store {
    path: Utf8PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize filter state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Store {
    #[must_use]
    pub fn new(dir: &Utf8Path) -> Self {
        Store {
            path: dir.join(STATE_FILE),
        }
    }

    /// A missing, unreadable, or corrupt state file yields the default
    /// state; persisted state must never take the process down.
    #[must_use]
    pub fn load(&self) -> FilterState {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return FilterState::default();
            }
            Err(err) => {
                warn!("failed to read filter state ({}): {err}", self.path);
                return FilterState::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(err) => {
                warn!("discarding corrupt filter state ({}): {err}", self.path);
                FilterState::default()
            }
        }
    }

    pub fn save(&self, state: &FilterState) -> Result<(), SaveError> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use camino::Utf8Path;
    use pretty_assertions::assert_eq;

    use crate::filter::FilterState;

    use super::{Store, STATE_FILE};

    #[test]
    fn missing_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(Utf8Path::from_path(tmp.path()).unwrap());

        assert_eq!(FilterState::default(), store.load());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::new(Utf8Path::from_path(tmp.path()).unwrap());

        let state = FilterState {
            page: "learn".to_owned(),
            kind: "videos".to_owned(),
            search_query: "agents".to_owned(),
            ..FilterState::default()
        };
        store.save(&state).unwrap();

        assert_eq!(state, store.load());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        std::fs::write(dir.join(STATE_FILE), "{not json").unwrap();

        let store = Store::new(dir);
        assert_eq!(FilterState::default(), store.load());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        std::fs::write(
            dir.join(STATE_FILE),
            r#"{"page":"learn","legacyField":[1,2,3]}"#,
        )
        .unwrap();

        let store = Store::new(dir);
        assert_eq!(
            FilterState {
                page: "learn".to_owned(),
                ..FilterState::default()
            },
            store.load()
        );
    }
}
