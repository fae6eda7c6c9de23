//! Document collections backing the service: `subscriptions` keyed by
//! endpoint and `tasks` keyed by id.
//!
//! Collections live in memory. When opened on a data directory every
//! mutation is followed by a TOML snapshot of the touched collection.

mod snapshot;
mod subscriptions;
mod tasks;

use std::path::{Path, PathBuf};

pub use subscriptions::SubscriptionStore;
pub use tasks::TaskStore;

pub const SUBSCRIPTIONS_FILE: &str = "subscriptions.toml";
pub const TASKS_FILE: &str = "tasks.toml";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: &'static str,
        #[source]
        source: toml::ser::Error,
    },
}

pub struct Store {
    subscriptions: SubscriptionStore,
    tasks: TaskStore,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            subscriptions: SubscriptionStore::default(),
            tasks: TaskStore::default(),
        }
    }

    /// Loads both collections from `dir`, creating it if needed. Missing
    /// collection files start empty.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let subscriptions = SubscriptionStore::open(dir.join(SUBSCRIPTIONS_FILE))?;
        let tasks = TaskStore::open(dir.join(TASKS_FILE))?;
        tracing::info!(
            dir = %dir.display(),
            subscriptions = subscriptions.len(),
            tasks = tasks.len(),
            "store opened"
        );
        Ok(Self {
            subscriptions,
            tasks,
        })
    }

    pub fn subscriptions(&self) -> &SubscriptionStore {
        &self.subscriptions
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }
}

#[cfg(test)]
pub(crate) fn create_temp_dir(test_name: &str) -> PathBuf {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    let dir = std::env::temp_dir().join(format!(
        "taskpush-{test_name}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
