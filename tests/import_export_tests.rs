use chrono::{TimeZone, Utc};
use feed_tree::{
    Feed, FeedMetadata, InstanceStatus, PersistenceError, PluginInstance, load_feed_from_csv,
    load_feed_from_json, save_feed_to_csv, save_feed_to_json,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn build_sample_feed() -> Feed {
    let mut metadata = FeedMetadata::default();
    metadata.id = Some(12);
    metadata.name = "Brain MRI age".into();
    metadata.owner = "radstar".into();
    metadata.creation_date = Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap();
    metadata.note = "Pediatric cohort, batch 2".into();

    let mut feed = Feed::new_with_metadata(metadata);

    let mut dircopy = PluginInstance::root(1, "pl-dircopy");
    dircopy.plugin_version = "2.1.1".into();
    dircopy.status = InstanceStatus::FinishedSuccessfully;
    dircopy.start_date = Some(Utc.with_ymd_and_hms(2025, 3, 4, 9, 31, 0).unwrap());
    dircopy.end_date = Some(Utc.with_ymd_and_hms(2025, 3, 4, 9, 33, 12).unwrap());
    feed.upsert_instance(dircopy).unwrap();

    let mut fshack = PluginInstance::child_of(2, 1, "pl-fshack");
    fshack.title = "Recon, with \"quotes\", and commas".into();
    fshack.status = InstanceStatus::Started;
    feed.upsert_instance(fshack).unwrap();

    feed.upsert_instance(PluginInstance::child_of(3, 2, "pl-mgz2lut_report"))
        .unwrap();
    feed
}

#[test]
fn json_round_trip_preserves_feed() {
    let feed = build_sample_feed();
    let file = NamedTempFile::new().unwrap();

    save_feed_to_json(&feed, file.path()).unwrap();
    let loaded = load_feed_from_json(file.path()).unwrap();

    assert_eq!(loaded.metadata(), feed.metadata());
    assert_eq!(loaded.instances(), feed.instances());
}

#[test]
fn csv_round_trip_preserves_feed_and_order() {
    let feed = build_sample_feed();
    let file = NamedTempFile::new().unwrap();

    save_feed_to_csv(&feed, file.path()).unwrap();
    let loaded = load_feed_from_csv(file.path()).unwrap();

    assert_eq!(loaded.metadata(), feed.metadata());
    assert_eq!(loaded.instances(), feed.instances());

    let ids: Vec<_> = loaded
        .layout()
        .layout
        .nodes
        .iter()
        .map(|node| node.item.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn json_load_rejects_duplicate_ids() {
    let snapshot = serde_json::json!({
        "metadata": FeedMetadata::default(),
        "instances": [
            PluginInstance::root(1, "pl-dircopy"),
            PluginInstance::root(1, "pl-mri10yr")
        ]
    });

    let file = NamedTempFile::new().unwrap();
    serde_json::to_writer_pretty(file.as_file(), &snapshot).unwrap();

    match load_feed_from_json(file.path()) {
        Err(PersistenceError::InvalidData(message)) => {
            assert!(message.contains("duplicate instance id 1"), "{message}")
        }
        other => panic!("expected duplicate id error, got {other:?}"),
    }
}

#[test]
fn json_load_keeps_orphans_for_the_tree_to_report() {
    let snapshot = serde_json::json!({
        "metadata": FeedMetadata::default(),
        "instances": [
            PluginInstance::child_of(5, 40, "pl-orphan"),
            PluginInstance::root(1, "pl-dircopy")
        ]
    });
    let file = NamedTempFile::new().unwrap();
    serde_json::to_writer(file.as_file(), &snapshot).unwrap();

    let feed = load_feed_from_json(file.path()).unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed.layout().unreachable, vec![5]);
}

#[test]
fn empty_feed_round_trips_through_csv_and_json() {
    let mut feed = Feed::new();
    feed.set_name("Fresh feed").unwrap();

    let csv_file = NamedTempFile::new().unwrap();
    save_feed_to_csv(&feed, csv_file.path()).unwrap();
    let from_csv = load_feed_from_csv(csv_file.path()).unwrap();
    assert!(from_csv.is_empty());
    assert_eq!(from_csv.metadata(), feed.metadata());

    let json_file = NamedTempFile::new().unwrap();
    save_feed_to_json(&feed, json_file.path()).unwrap();
    let from_json = load_feed_from_json(json_file.path()).unwrap();
    assert!(from_json.is_empty());
    assert_eq!(from_json.metadata(), feed.metadata());
}

#[test]
fn csv_load_rejects_empty_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id,previous_id,plugin_name,plugin_version,plugin_type,title,status,start_date,end_date,metadata_json"
    )
    .unwrap();

    match load_feed_from_csv(file.path()) {
        Err(PersistenceError::InvalidData(message)) => {
            assert!(message.contains("no instances"), "{message}")
        }
        other => panic!("expected empty csv error, got {other:?}"),
    }
}

#[test]
fn csv_load_rejects_bad_status() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id,previous_id,plugin_name,plugin_version,plugin_type,title,status,start_date,end_date,metadata_json"
    )
    .unwrap();
    writeln!(file, "1,,pl-dircopy,2.1.1,fs,,exploded,,,").unwrap();

    match load_feed_from_csv(file.path()) {
        Err(PersistenceError::InvalidData(message)) => {
            assert!(message.contains("unknown instance status"), "{message}")
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn csv_without_metadata_row_uses_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id,previous_id,plugin_name,plugin_version,plugin_type,title,status,start_date,end_date,metadata_json"
    )
    .unwrap();
    writeln!(file, "2,1,pl-fshack,,ds,,started,,,").unwrap();
    writeln!(file, "1,,pl-dircopy,,fs,,finishedSuccessfully,,,").unwrap();

    let feed = load_feed_from_csv(file.path()).unwrap();
    assert_eq!(feed.name(), FeedMetadata::default().name);
    assert_eq!(feed.instances()[0].id, 2);
    assert_eq!(feed.progress().finished, 1);
}
