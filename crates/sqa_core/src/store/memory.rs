use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::AppError;

use super::{validate_key, BlobStore};

/// In-process backend. Not shared across threads; one stage invocation owns it.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    namespaces: RefCell<BTreeSet<String>>,
    blobs: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn under(key: &str, prefix: &str) -> bool {
    key == prefix || key.starts_with(&format!("{prefix}/"))
}

impl BlobStore for MemoryBlobStore {
    fn namespace_exists(&self, namespace: &str) -> Result<bool, AppError> {
        validate_key(namespace)?;
        if self.namespaces.borrow().contains(namespace) {
            return Ok(true);
        }
        Ok(self.blobs.borrow().keys().any(|k| under(k, namespace)))
    }

    fn create_namespace(&self, namespace: &str) -> Result<bool, AppError> {
        if self.namespace_exists(namespace)? {
            return Ok(false);
        }
        Ok(self.namespaces.borrow_mut().insert(namespace.to_string()))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        validate_key(key)?;
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        validate_key(key)?;
        self.blobs.borrow_mut().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        validate_key(prefix)?;
        // BTreeMap iteration is already sorted.
        Ok(self
            .blobs
            .borrow()
            .keys()
            .filter(|k| under(k, prefix))
            .cloned()
            .collect())
    }

    fn delete_prefix(&self, prefix: &str) -> Result<(), AppError> {
        validate_key(prefix)?;
        self.blobs.borrow_mut().retain(|k, _| !under(k, prefix));
        self.namespaces.borrow_mut().retain(|n| !under(n, prefix));
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}
