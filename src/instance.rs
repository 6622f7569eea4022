use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type InstanceId = i32;

/// Anything that can be placed in a feed tree: it has an id and optionally
/// points at the instance it was run on top of.
pub trait TreeItem {
    fn id(&self) -> InstanceId;
    fn previous_id(&self) -> Option<InstanceId>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    /// Feed synthesis. Creates a feed, always a root.
    Fs,
    /// Data synthesis. Runs on the output of a single previous instance.
    #[default]
    Ds,
    /// Topology synthesis. Joins outputs of several instances.
    Ts,
}

impl PluginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginType::Fs => "fs",
            PluginType::Ds => "ds",
            PluginType::Ts => "ts",
        }
    }
}

impl FromStr for PluginType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fs" => Ok(PluginType::Fs),
            "ds" => Ok(PluginType::Ds),
            "ts" => Ok(PluginType::Ts),
            _ => Err(ParseEnumError::new("plugin type", value)),
        }
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    #[default]
    Created,
    Waiting,
    Scheduled,
    Started,
    RegisteringFiles,
    FinishedSuccessfully,
    FinishedWithError,
    Cancelled,
}

impl InstanceStatus {
    pub const ALL: [InstanceStatus; 8] = [
        InstanceStatus::Created,
        InstanceStatus::Waiting,
        InstanceStatus::Scheduled,
        InstanceStatus::Started,
        InstanceStatus::RegisteringFiles,
        InstanceStatus::FinishedSuccessfully,
        InstanceStatus::FinishedWithError,
        InstanceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Created => "created",
            InstanceStatus::Waiting => "waiting",
            InstanceStatus::Scheduled => "scheduled",
            InstanceStatus::Started => "started",
            InstanceStatus::RegisteringFiles => "registeringFiles",
            InstanceStatus::FinishedSuccessfully => "finishedSuccessfully",
            InstanceStatus::FinishedWithError => "finishedWithError",
            InstanceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, InstanceStatus::FinishedSuccessfully)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, InstanceStatus::FinishedWithError)
    }

    /// Still queued or running on the compute resource.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            InstanceStatus::Created
                | InstanceStatus::Waiting
                | InstanceStatus::Scheduled
                | InstanceStatus::Started
                | InstanceStatus::RegisteringFiles
        )
    }
}

impl FromStr for InstanceStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        InstanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseEnumError::new("instance status", value))
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// One plugin run inside a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInstance {
    pub id: InstanceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<InstanceId>,
    pub plugin_name: String,
    #[serde(default)]
    pub plugin_version: String,
    #[serde(default)]
    pub plugin_type: PluginType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl PluginInstance {
    pub fn new(id: InstanceId, plugin_name: impl Into<String>) -> Self {
        Self {
            id,
            previous_id: None,
            plugin_name: plugin_name.into(),
            plugin_version: String::new(),
            plugin_type: PluginType::Ds,
            title: String::new(),
            status: InstanceStatus::Created,
            start_date: None,
            end_date: None,
        }
    }

    /// A feed-synthesis instance with no predecessor.
    pub fn root(id: InstanceId, plugin_name: impl Into<String>) -> Self {
        let mut instance = Self::new(id, plugin_name);
        instance.plugin_type = PluginType::Fs;
        instance
    }

    pub fn child_of(
        id: InstanceId,
        previous_id: InstanceId,
        plugin_name: impl Into<String>,
    ) -> Self {
        let mut instance = Self::new(id, plugin_name);
        instance.previous_id = Some(previous_id);
        instance
    }

    /// Title if set, plugin name otherwise.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.plugin_name
        } else {
            &self.title
        }
    }
}

impl TreeItem for PluginInstance {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn previous_id(&self) -> Option<InstanceId> {
        self.previous_id
    }
}
