use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::KeyValueStore;

/// File-backed store: one file per key under a base directory.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!("Failed to create store directory: {}", base_dir.display())
        })?;
        Ok(Self { base_dir })
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Map a key to a filesystem-safe file stem.
/// Keys are short identifiers like "fit-groups"; anything outside
/// [A-Za-z0-9._-] becomes '_'.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store file: {}", path.display()))?;
        Ok(Some(contents))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key);
        fs::write(&path, value)
            .with_context(|| format!("Failed to write store file: {}", path.display()))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.item_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove store file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get_item() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        store.set_item("fit-groups", r#"[{"id":1}]"#).unwrap();
        let value = store.get_item("fit-groups").unwrap();
        assert_eq!(value.as_deref(), Some(r#"[{"id":1}]"#));
    }

    #[test]
    fn test_get_missing_item() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        assert!(store.get_item("nothing-here").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        store.set_item("k", "first").unwrap();
        store.set_item("k", "second").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_remove_item_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        store.set_item("k", "v").unwrap();
        store.remove_item("k").unwrap();
        assert!(store.get_item("k").unwrap().is_none());

        // Removing again is a no-op
        store.remove_item("k").unwrap();
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("fit-groups"), "fit-groups");
        assert_eq!(sanitize_key("training-days-cache"), "training-days-cache");
        assert_eq!(sanitize_key("a/b\\c:d"), "a_b_c_d");
    }

    #[test]
    fn test_keys_with_same_sanitized_form_collide_predictably() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        store.set_item("a/b", "one").unwrap();
        store.set_item("a_b", "two").unwrap();
        // Both map to a_b.json; last write wins
        assert_eq!(store.get_item("a/b").unwrap().as_deref(), Some("two"));
    }
}
