use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::runner::{DispatchError, Job};

/// Name-to-job resolution for the in-process runner.
///
/// Workflow plans carry job references as registered class-name strings, so
/// dispatch needs a lookup from those strings back to something performable.
pub struct JobRegistry {
    jobs: DashMap<String, Arc<dyn Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    /// Register `job` under `class_name`, replacing any previous registration.
    pub fn register(&self, class_name: impl Into<String>, job: Arc<dyn Job>) {
        let class_name = class_name.into();
        debug!(class_name = %class_name, "registering job");
        self.jobs.insert(class_name, job);
    }

    pub fn resolve(&self, class_name: &str) -> Result<Arc<dyn Job>, DispatchError> {
        self.jobs
            .get(class_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DispatchError::UnknownJobClass {
                class_name: class_name.to_string(),
            })
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.jobs.contains_key(class_name)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.jobs.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
