use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AppError;

use super::{validate_key, BlobStore};

/// Local-directory backend: key `a/b/c` lives at `<root>/a/b/c`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }

    fn ensure_root(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::io("STORE_MKDIR_FAILED", "Failed to create store root directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }
}

fn list_files_recursive_sorted(root: &Path) -> Result<Vec<PathBuf>, AppError> {
    fn walk(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<(), AppError> {
        let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)
            .map_err(|e| {
                AppError::io("STORE_READDIR_FAILED", "Failed to read store directory")
                    .with_details(format!("path={}; err={}", dir.display(), e))
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                AppError::io("STORE_READDIR_FAILED", "Failed to read store directory entry")
                    .with_details(format!("path={}; err={}", dir.display(), e))
            })?;

        entries.sort_by_key(|e| e.file_name());
        for e in entries {
            let p = e.path();
            let meta = e.metadata().map_err(|err| {
                AppError::io("STORE_STAT_FAILED", "Failed to stat store entry")
                    .with_details(format!("path={}; err={}", p.display(), err))
            })?;
            if meta.is_dir() {
                walk(&p, acc)?;
            } else if meta.is_file() {
                acc.push(p);
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(root, &mut out)?;
    out.sort();
    Ok(out)
}

impl BlobStore for FsBlobStore {
    fn namespace_exists(&self, namespace: &str) -> Result<bool, AppError> {
        Ok(self.path_for(namespace)?.is_dir())
    }

    fn create_namespace(&self, namespace: &str) -> Result<bool, AppError> {
        let path = self.path_for(namespace)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::io("STORE_MKDIR_FAILED", "Failed to create namespace parent directory")
                    .with_details(format!("path={}; err={}", parent.display(), e))
            })?;
        } else {
            self.ensure_root()?;
        }
        match fs::create_dir(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(AppError::io("STORE_MKDIR_FAILED", "Failed to create namespace directory")
                .with_details(format!("path={}; err={}", path.display(), e))),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path).map(Some).map_err(|e| {
            AppError::io("STORE_READ_FAILED", "Failed to read blob")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::io("STORE_MKDIR_FAILED", "Failed to create blob directory")
                    .with_details(format!("path={}; err={}", parent.display(), e))
            })?;
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!("{file_name}.tmp"));
        fs::write(&tmp, bytes).map_err(|e| {
            AppError::io("STORE_WRITE_FAILED", "Failed to write blob")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::io("STORE_WRITE_FAILED", "Failed to finalize blob write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "blob written");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let path = self.path_for(prefix)?;
        if path.is_file() {
            return Ok(vec![prefix.to_string()]);
        }
        if !path.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for abs in list_files_recursive_sorted(&path)? {
            let rel = abs.strip_prefix(&self.root).map_err(|e| {
                AppError::io("STORE_PATH_FAILED", "Failed to compute relative blob path")
                    .with_details(e.to_string())
            })?;
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
        keys.sort();
        Ok(keys)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<(), AppError> {
        let path = self.path_for(prefix)?;
        let res = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else if path.is_file() {
            fs::remove_file(&path)
        } else {
            return Ok(());
        };
        res.map_err(|e| {
            AppError::io("STORE_DELETE_FAILED", "Failed to delete blob prefix")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    fn location(&self, key: &str) -> String {
        self.root.join(key).display().to_string()
    }
}
