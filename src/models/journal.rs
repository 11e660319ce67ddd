use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A personal note the user keeps alongside their program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub body: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A stored body-imbalance photo reference. The image bytes live with the
/// service; the client only lists metadata and URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceImage {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}
