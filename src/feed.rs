use crate::graph::{TreeBuild, build_tree_with_diagnostics};
use crate::instance::{InstanceId, InstanceStatus, PluginInstance, TreeItem};
use crate::instance_validation::{self, InstanceValidationError};
use crate::metadata::FeedMetadata;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("feed name must not be blank")]
    BlankName,
    #[error("instance {0} not found")]
    InstanceNotFound(InstanceId),
    #[error(transparent)]
    Validation(#[from] InstanceValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedProgress {
    pub total: usize,
    pub finished: usize,
    pub errored: usize,
    pub cancelled: usize,
    pub active: usize,
    /// Share of instances that finished successfully, 0 to 100.
    pub percent_complete: f64,
}

impl FeedProgress {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("instances={}", self.total));
        parts.push(format!("finished={}", self.finished));
        if self.active > 0 {
            parts.push(format!("active={}", self.active));
        }
        if self.errored > 0 {
            parts.push(format!("errors={}", self.errored));
        }
        if self.cancelled > 0 {
            parts.push(format!("cancelled={}", self.cancelled));
        }
        parts.push(format!("progress={:.0}%", self.percent_complete));
        parts.join(", ")
    }
}

/// A feed: its metadata plus every plugin instance run in it, in the order
/// the API lists them (newest first).
#[derive(Debug, Clone)]
pub struct Feed {
    metadata: FeedMetadata,
    instances: Vec<PluginInstance>,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    pub fn new() -> Self {
        Self::new_with_metadata(FeedMetadata::default())
    }

    pub fn new_with_metadata(metadata: FeedMetadata) -> Self {
        Self {
            metadata,
            instances: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn set_metadata(&mut self, metadata: FeedMetadata) -> Result<(), FeedError> {
        if metadata.name.trim().is_empty() {
            return Err(FeedError::BlankName);
        }
        self.metadata = metadata;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FeedError> {
        let mut metadata = self.metadata.clone();
        metadata.name = name.into();
        self.set_metadata(metadata)
    }

    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.metadata.owner = owner.into();
    }

    pub fn instances(&self) -> &[PluginInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn find_instance(&self, id: InstanceId) -> Option<&PluginInstance> {
        self.instances.iter().find(|instance| instance.id == id)
    }

    fn find_instance_mut(&mut self, id: InstanceId) -> Result<&mut PluginInstance, FeedError> {
        self.instances
            .iter_mut()
            .find(|instance| instance.id == id)
            .ok_or(FeedError::InstanceNotFound(id))
    }

    pub fn next_id(&self) -> InstanceId {
        self.instances
            .iter()
            .map(|instance| instance.id)
            .max()
            .map(|max| max + 1)
            .unwrap_or(1)
    }

    /// Replaces the instance with the same id in place, or adds it as the
    /// newest instance.
    pub fn upsert_instance(&mut self, instance: PluginInstance) -> Result<(), FeedError> {
        instance_validation::validate_instance(&instance)?;
        match self.instances.iter_mut().find(|row| row.id == instance.id) {
            Some(existing) => *existing = instance,
            None => self.instances.insert(0, instance),
        }
        Ok(())
    }

    /// Removes the instance and every instance that descends from it. Returns
    /// the removed ids, empty when `id` is unknown.
    pub fn delete_instance(&mut self, id: InstanceId) -> Vec<InstanceId> {
        if self.find_instance(id).is_none() {
            return Vec::new();
        }

        let mut children: HashMap<InstanceId, Vec<InstanceId>> = HashMap::new();
        for instance in &self.instances {
            if let Some(previous) = instance.previous_id() {
                children.entry(previous).or_default().push(instance.id);
            }
        }

        let mut doomed = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if doomed.insert(current) {
                if let Some(next) = children.get(&current) {
                    stack.extend(next.iter().copied());
                }
            }
        }

        let mut removed = Vec::with_capacity(doomed.len());
        self.instances.retain(|instance| {
            if doomed.contains(&instance.id) {
                removed.push(instance.id);
                false
            } else {
                true
            }
        });
        debug!(id, removed = removed.len(), "deleted instance subtree");
        removed
    }

    pub fn set_status(&mut self, id: InstanceId, status: InstanceStatus) -> Result<(), FeedError> {
        self.find_instance_mut(id)?.status = status;
        Ok(())
    }

    pub fn set_title(&mut self, id: InstanceId, title: impl Into<String>) -> Result<(), FeedError> {
        self.find_instance_mut(id)?.title = title.into();
        Ok(())
    }

    /// Tree of the whole feed, anchored at the first instance without a
    /// predecessor.
    pub fn layout(&self) -> TreeBuild<'_, PluginInstance> {
        self.layout_from(None)
    }

    pub fn layout_from(&self, root_hint: Option<InstanceId>) -> TreeBuild<'_, PluginInstance> {
        build_tree_with_diagnostics(&self.instances, root_hint)
    }

    pub fn progress(&self) -> FeedProgress {
        let total = self.instances.len();
        let mut finished = 0;
        let mut errored = 0;
        let mut cancelled = 0;
        let mut active = 0;
        for instance in &self.instances {
            match instance.status {
                status if status.is_finished() => finished += 1,
                status if status.is_error() => errored += 1,
                InstanceStatus::Cancelled => cancelled += 1,
                _ => active += 1,
            }
        }
        let percent_complete = if total == 0 {
            0.0
        } else {
            finished as f64 * 100.0 / total as f64
        };
        FeedProgress {
            total,
            finished,
            errored,
            cancelled,
            active,
            percent_complete,
        }
    }
}
