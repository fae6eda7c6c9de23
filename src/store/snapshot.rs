use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::StoreError;

/// A collection file on disk. Writes go to a sibling temp file first and are
/// renamed into place so a crash never leaves a half-written snapshot.
#[derive(Debug, Clone)]
pub(super) struct Snapshot {
    path: PathBuf,
    collection: &'static str,
}

impl Snapshot {
    pub(super) fn new(path: PathBuf, collection: &'static str) -> Self {
        Self { path, collection }
    }

    pub(super) fn load<T: DeserializeOwned + Default>(&self) -> Result<T, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub(super) fn save<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let contents = toml::to_string(value).map_err(|source| StoreError::Serialize {
            collection: self.collection,
            source,
        })?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, contents).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
