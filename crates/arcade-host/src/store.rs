use std::path::PathBuf;

use arcade_core::persistence::RecordStore;

/// File-backed record store: one JSON document per player profile.
/// I/O failures degrade to "no record", matching the adapter contract
/// that a bad backing entry never takes the engine down.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordStore for FileStore {
    fn load_raw(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn save_raw(&mut self, raw: &str) {
        if let Err(error) = std::fs::write(&self.path, raw) {
            tracing::warn!(path = %self.path.display(), %error, "Failed to persist player record");
        }
    }

    fn clear(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arcade-store-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn round_trips_and_clears() {
        let mut store = FileStore::new(scratch_path("roundtrip"));
        store.clear();
        assert_eq!(store.load_raw(), None);
        store.save_raw("{\"currency\":5}");
        assert_eq!(store.load_raw().as_deref(), Some("{\"currency\":5}"));
        store.clear();
        assert_eq!(store.load_raw(), None);
    }
}
