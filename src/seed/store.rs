// src/seed/store.rs

//! Object storage abstraction used by the seed handler.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ObjectStore {
    fn put_object(&mut self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError>;

    fn delete_object(&mut self, bucket: &str, key: &str) -> Result<(), StoreError>;
}

/// Objects kept in memory, keyed by `(bucket, key)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<(String, String), Vec<u8>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<&[u8]> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put_object(&mut self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        self.objects
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
        Ok(())
    }

    fn delete_object(&mut self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.objects
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

/// Objects stored as files under `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path of an object. Keys may not escape the bucket.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        for part in [bucket, key] {
            let ok = !part.is_empty()
                && Path::new(part)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !ok {
                return Err(StoreError::InvalidKey(format!("{bucket}/{key}")));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for LocalDirStore {
    fn put_object(&mut self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, body)?;
        Ok(())
    }

    fn delete_object(&mut self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
