//! Typed views over the JSON objects the Pipio services return.
//!
//! Every field the dashboard does not strictly need is optional, and fields
//! nobody asked for are kept in `extra` so a record can be shown in full.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

pub const MAX_SCRIPT_CHARS: usize = 5000;
pub const OTHER_ETHNICITY: &str = "Other";

/// Remote job state. Unknown values are kept verbatim instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Unknown(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|r| JobStatus::parse(&r)).unwrap_or_default())
    }
}

// Ids are opaque; some listings send them as numbers.
fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub thumbnail_image_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Avatar {
    pub fn ethnicity_or_other(&self) -> &str {
        self.ethnicity.as_deref().unwrap_or(OTHER_ETHNICITY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub voice_type: Option<String>,
    #[serde(default)]
    pub preview_audio_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Voice {
    /// `"Name (en/es)"`, the label shown in voice pickers.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.languages.join("/"))
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    /// The video reference, only once the job has completed.
    pub fn playable_url(&self) -> Option<&str> {
        if self.status.is_completed() {
            self.video_url.as_deref()
        } else {
            None
        }
    }

    pub fn script_snippet(&self, max_chars: usize) -> String {
        match &self.script {
            None => "N/A".to_string(),
            Some(script) if script.chars().count() <= max_chars => script.clone(),
            Some(script) => {
                let cut: String = script.chars().take(max_chars).collect();
                format!("{}...", cut)
            }
        }
    }

    pub fn download_name(&self) -> String {
        format!("pipio_{}.mp4", self.id)
    }
}

/// `{ "items": [...] }` listing wrapper; a missing or null list is empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateClipRequest {
    pub actor_id: String,
    pub voice_id: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DubbingRequest {
    pub source_url: String,
    pub target_language: String,
    pub source_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSyncRequest {
    pub source_url: String,
    pub target_audio_url: String,
}
