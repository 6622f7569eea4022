use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    pub owner: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            id: None,
            name: "Untitled Feed".to_string(),
            owner: "chris".to_string(),
            creation_date: Utc::now(),
            note: String::new(),
        }
    }
}
