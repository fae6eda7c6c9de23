use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::StoreError;
use super::snapshot::Snapshot;
use crate::types::task::{Task, TaskStats};

#[derive(Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Default)]
pub struct TaskStore {
    records: Mutex<HashMap<String, Task>>,
    snapshot: Option<Snapshot>,
}

impl TaskStore {
    pub(super) fn open(path: PathBuf) -> Result<Self, StoreError> {
        let snapshot = Snapshot::new(path, "tasks");
        let file: TaskFile = snapshot.load()?;
        let records = file
            .tasks
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();
        Ok(Self {
            records: Mutex::new(records),
            snapshot: Some(snapshot),
        })
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("tasks lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, task: Task) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("tasks lock");
        let mut staged = records.clone();
        staged.insert(task.id.clone(), task);
        self.commit(&mut records, staged)
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let records = self.records.lock().expect("tasks lock");
        records.get(id).cloned()
    }

    /// All tasks, newest first.
    pub fn list(&self) -> Vec<Task> {
        let records = self.records.lock().expect("tasks lock");
        let mut tasks: Vec<Task> = records.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Runs `change` against the stored task and persists the result.
    /// Returns `None` when no task has that id.
    pub fn modify<R>(
        &self,
        id: &str,
        change: impl FnOnce(&mut Task) -> R,
    ) -> Result<Option<(Task, R)>, StoreError> {
        let mut records = self.records.lock().expect("tasks lock");
        let mut staged = records.clone();
        let Some(task) = staged.get_mut(id) else {
            return Ok(None);
        };
        let result = change(task);
        let updated = task.clone();
        self.commit(&mut records, staged)?;
        Ok(Some((updated, result)))
    }

    pub fn remove(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let mut records = self.records.lock().expect("tasks lock");
        let mut staged = records.clone();
        let Some(task) = staged.remove(id) else {
            return Ok(None);
        };
        self.commit(&mut records, staged)?;
        Ok(Some(task))
    }

    pub fn stats(&self, now: OffsetDateTime) -> TaskStats {
        let records = self.records.lock().expect("tasks lock");
        records
            .values()
            .fold(TaskStats::default(), |mut stats, task| {
                stats.total += 1;
                if task.completed {
                    stats.completed += 1;
                } else {
                    stats.pending += 1;
                }
                if task.is_overdue(now) {
                    stats.overdue += 1;
                }
                stats
            })
    }

    /// Swaps `staged` in only after it reached disk; a failed write leaves
    /// the live records untouched.
    fn commit(
        &self,
        records: &mut HashMap<String, Task>,
        staged: HashMap<String, Task>,
    ) -> Result<(), StoreError> {
        self.persist(&staged)?;
        *records = staged;
        Ok(())
    }

    fn persist(&self, records: &HashMap<String, Task>) -> Result<(), StoreError> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Ok(());
        };
        let mut tasks: Vec<Task> = records.values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        snapshot.save(&TaskFile { tasks })
    }
}
