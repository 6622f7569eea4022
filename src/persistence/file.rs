use super::{PersistenceError, PersistenceResult};
use crate::instance::{InstanceStatus, PluginInstance, PluginType};
use crate::{Feed, FeedMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

#[derive(Serialize, Deserialize)]
struct FeedSnapshot {
    metadata: FeedMetadata,
    instances: Vec<PluginInstance>,
}

impl FeedSnapshot {
    fn from_feed(feed: &Feed) -> PersistenceResult<Self> {
        super::validate_instances(feed.instances())?;
        Ok(Self {
            metadata: feed.metadata().clone(),
            instances: feed.instances().to_vec(),
        })
    }

    fn into_feed(self) -> PersistenceResult<Feed> {
        super::feed_from_parts(self.metadata, self.instances)
    }
}

pub fn save_feed_to_json<P: AsRef<Path>>(feed: &Feed, path: P) -> PersistenceResult<()> {
    let snapshot = FeedSnapshot::from_feed(feed)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(path = %path.as_ref().display(), instances = feed.len(), "saved feed as json");
    Ok(())
}

pub fn load_feed_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Feed> {
    let file = File::open(path.as_ref())?;
    let snapshot: FeedSnapshot = serde_json::from_reader(file)?;
    let feed = snapshot.into_feed()?;
    info!(path = %path.as_ref().display(), instances = feed.len(), "loaded feed from json");
    Ok(feed)
}

#[derive(Default, Serialize, Deserialize)]
struct InstanceCsvRecord {
    id: i32,
    previous_id: String,
    plugin_name: String,
    plugin_version: String,
    plugin_type: String,
    title: String,
    status: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    metadata_json: String,
}

impl From<&PluginInstance> for InstanceCsvRecord {
    fn from(instance: &PluginInstance) -> Self {
        Self {
            id: instance.id,
            previous_id: format_option_i32(instance.previous_id),
            plugin_name: instance.plugin_name.clone(),
            plugin_version: instance.plugin_version.clone(),
            plugin_type: instance.plugin_type.to_string(),
            title: instance.title.clone(),
            status: instance.status.to_string(),
            start_date: format_datetime(instance.start_date),
            end_date: format_datetime(instance.end_date),
            metadata_json: String::new(),
        }
    }
}

impl InstanceCsvRecord {
    fn metadata_row(feed: &Feed) -> PersistenceResult<Self> {
        Ok(Self {
            plugin_name: "__metadata__".to_string(),
            metadata_json: serde_json::to_string(feed.metadata())?,
            ..Self::default()
        })
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn into_instance(self) -> PersistenceResult<PluginInstance> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to an instance".into(),
            ));
        }
        let mut instance = PluginInstance::new(self.id, self.plugin_name);
        instance.previous_id = parse_option_i32(&self.previous_id)?;
        instance.plugin_version = self.plugin_version;
        instance.plugin_type = self
            .plugin_type
            .parse::<PluginType>()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        instance.title = self.title;
        instance.status = self
            .status
            .parse::<InstanceStatus>()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        instance.start_date = parse_datetime(&self.start_date)?;
        instance.end_date = parse_datetime(&self.end_date)?;
        Ok(instance)
    }
}

pub fn save_feed_to_csv<P: AsRef<Path>>(feed: &Feed, path: P) -> PersistenceResult<()> {
    super::validate_instances(feed.instances())?;
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(InstanceCsvRecord::metadata_row(feed)?)?;
    for instance in feed.instances() {
        writer.serialize(InstanceCsvRecord::from(instance))?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), instances = feed.len(), "saved feed as csv");
    Ok(())
}

pub fn load_feed_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Feed> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut instances = Vec::new();
    let mut metadata: Option<FeedMetadata> = None;
    for record in reader.deserialize::<InstanceCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if metadata.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
            })?);
            continue;
        }
        instances.push(record.into_instance()?);
    }

    if metadata.is_none() && instances.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no metadata row and no instances".into(),
        ));
    }

    let feed = super::feed_from_parts(metadata.unwrap_or_default(), instances)?;
    info!(path = %path.as_ref().display(), instances = feed.len(), "loaded feed from csv");
    Ok(feed)
}

fn format_datetime(value: Option<DateTime<Utc>>) -> String {
    value.map(|v| v.to_rfc3339()).unwrap_or_default()
}

fn parse_datetime(input: &str) -> PersistenceResult<Option<DateTime<Utc>>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid timestamp '{input}': {e}")))
}

fn format_option_i32(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_option_i32(input: &str) -> PersistenceResult<Option<i32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i32>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}
