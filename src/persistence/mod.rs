use crate::instance::PluginInstance;
use crate::instance_validation;
use crate::{Feed, FeedError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<FeedError> for PersistenceError {
    fn from(value: FeedError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait FeedStore {
    fn save_feed(&self, feed: &Feed) -> PersistenceResult<()>;
    fn load_feed(&self) -> PersistenceResult<Option<Feed>>;
}

pub fn validate_instances(instances: &[PluginInstance]) -> PersistenceResult<()> {
    instance_validation::validate_instance_collection(instances)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

/// Rebuilds a feed from stored instances listed newest first.
pub(crate) fn feed_from_parts(
    metadata: crate::FeedMetadata,
    instances: Vec<PluginInstance>,
) -> PersistenceResult<Feed> {
    validate_instances(&instances)?;
    let mut feed = Feed::new_with_metadata(metadata);
    // upsert prepends, so feed them oldest first to keep the stored order
    for instance in instances.into_iter().rev() {
        feed.upsert_instance(instance)?;
    }
    Ok(feed)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_feed_from_csv, load_feed_from_json, save_feed_to_csv, save_feed_to_json};
