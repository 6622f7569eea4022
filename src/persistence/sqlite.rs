use super::{FeedStore, PersistenceError, PersistenceResult};
use crate::instance::PluginInstance;
use crate::{Feed, FeedMetadata};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;
use tracing::info;

pub struct SqliteFeedStore {
    connection: Mutex<Connection>,
}

impl SqliteFeedStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS feed_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS plugin_instances (
                position INTEGER PRIMARY KEY,
                id INTEGER NOT NULL UNIQUE,
                previous_id INTEGER,
                instance_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection mutex poisoned".into()))
    }

    fn save_metadata(
        &self,
        tx: &rusqlite::Transaction,
        metadata: &FeedMetadata,
    ) -> PersistenceResult<()> {
        let json = serde_json::to_string(metadata)?;
        tx.execute("DELETE FROM feed_metadata", [])?;
        tx.execute(
            "INSERT INTO feed_metadata (id, metadata_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_instances(&self, tx: &rusqlite::Transaction, feed: &Feed) -> PersistenceResult<()> {
        tx.execute("DELETE FROM plugin_instances", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO plugin_instances (position, id, previous_id, instance_json) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, instance) in feed.instances().iter().enumerate() {
            let json = serde_json::to_string(instance)?;
            stmt.execute(params![
                position as i64,
                instance.id,
                instance.previous_id,
                json
            ])?;
        }
        Ok(())
    }
}

impl FeedStore for SqliteFeedStore {
    fn save_feed(&self, feed: &Feed) -> PersistenceResult<()> {
        super::validate_instances(feed.instances())?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        self.save_metadata(&tx, feed.metadata())?;
        self.save_instances(&tx, feed)?;
        tx.commit()?;
        info!(instances = feed.len(), "saved feed to sqlite");
        Ok(())
    }

    fn load_feed(&self) -> PersistenceResult<Option<Feed>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT metadata_json FROM feed_metadata WHERE id = 1")?;
        let metadata_json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

        let Some(metadata_json) = metadata_json else {
            return Ok(None);
        };
        let metadata: FeedMetadata = serde_json::from_str(&metadata_json)?;

        let mut stmt =
            conn.prepare("SELECT instance_json FROM plugin_instances ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut instances = Vec::new();
        for json in rows {
            let instance: PluginInstance = serde_json::from_str(&json?)?;
            instances.push(instance);
        }

        let feed = super::feed_from_parts(metadata, instances)?;
        info!(instances = feed.len(), "loaded feed from sqlite");
        Ok(Some(feed))
    }
}
