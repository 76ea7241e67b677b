//! Key/blob persistence the run store is written against.
//!
//! Keys are `/`-separated relative paths (`<run_id>/draft_answers.json`). A namespace is
//! the first key segment and corresponds to one run; its existence is what makes a run
//! exist. `FsBlobStore` maps keys onto a local directory tree, `MemoryBlobStore` keeps
//! everything in process. Any other backend (object storage, etc.) only has to honor the
//! same six operations.

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use crate::error::AppError;

pub trait BlobStore {
    fn namespace_exists(&self, namespace: &str) -> Result<bool, AppError>;

    /// Atomically claim a namespace. Returns `false` when it is already taken.
    fn create_namespace(&self, namespace: &str) -> Result<bool, AppError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError>;

    /// All keys below `prefix`, sorted ascending.
    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    /// Remove `prefix` and everything below it. Missing prefixes are not an error.
    fn delete_prefix(&self, prefix: &str) -> Result<(), AppError>;

    /// Human-readable location for diagnostics.
    fn location(&self, key: &str) -> String;

    fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.get(key)?.is_some())
    }
}

pub fn validate_key(key: &str) -> Result<(), AppError> {
    let bad = |reason: &str| {
        AppError::input("STORE_KEY_INVALID", "Blob key is not a clean relative path")
            .with_details(format!("key={key}; reason={reason}"))
    };
    if key.is_empty() {
        return Err(bad("empty"));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(bad("absolute or backslash"));
    }
    for segment in key.split('/') {
        if segment.is_empty() {
            return Err(bad("empty segment"));
        }
        if segment == "." || segment == ".." {
            return Err(bad("dot segment"));
        }
    }
    Ok(())
}

pub fn join_key(prefix: &str, rest: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), rest.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation_rejects_escapes() {
        assert!(validate_key("run-1/sources/01_a.md").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("run-1/../other").is_err());
        assert!(validate_key("run-1//x").is_err());
        assert!(validate_key("run-1\\x").is_err());
    }

    #[test]
    fn join_key_normalizes_slashes() {
        assert_eq!(join_key("run/", "/a.json"), "run/a.json");
        assert_eq!(join_key("run", "export_package/answers.csv"), "run/export_package/answers.csv");
    }
}
