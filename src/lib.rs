pub mod config;
pub mod feed;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod instance;
pub(crate) mod instance_validation;
pub mod metadata;
pub mod persistence;
pub mod render;

pub use config::{ConfigError, ServerConfig};
pub use feed::{Feed, FeedError, FeedProgress};
pub use graph::feed_dag::{FeedDag, UnreachableReport, classify_unreachable};
pub use graph::{
    LayoutLink, LayoutNode, TreeBuild, TreeBuilder, TreeLayout, build_tree,
    build_tree_with_diagnostics,
};
pub use instance::{InstanceId, InstanceStatus, PluginInstance, PluginType, TreeItem};
pub use instance_validation::InstanceValidationError;
pub use metadata::FeedMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteFeedStore;
pub use persistence::{
    FeedStore, PersistenceError, load_feed_from_csv, load_feed_from_json, save_feed_to_csv,
    save_feed_to_json, validate_instances,
};
pub use render::{render_instance_table, render_tree};
