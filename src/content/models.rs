/// Content store document models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque image reference resolved through `AssetUrlResolver`
///
/// Accepts a bare string, `{ "_ref": .. }` or the store's image object
/// `{ "asset": { "_ref": .. } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct AssetRef {
            #[serde(rename = "_ref")]
            reference: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Image { asset: AssetRef },
            Reference(AssetRef),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(reference) => ImageRef(reference),
            Raw::Image { asset } => ImageRef(asset.reference),
            Raw::Reference(asset) => ImageRef(asset.reference),
        })
    }
}

/// Project entry (`_type == "project"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Live preview URL
    #[serde(default)]
    pub project_link: Option<String>,
    /// Source code URL
    #[serde(default)]
    pub code_link: Option<String>,
    #[serde(rename = "imgUrl", default)]
    pub image: Option<ImageRef>,
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub tags: Vec<String>,
}

/// Skill entry (`_type == "skills"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<ImageRef>,
    #[serde(default, deserialize_with = "deserialize_category")]
    pub category: Option<String>,
}

/// Contact submission status; only `New` is ever written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    New,
}

/// Contact message written to the store (`_type == "contact"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(rename = "_type")]
    pub document_type: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

impl ContactSubmission {
    pub const DOCUMENT_TYPE: &'static str = "contact";

    /// Build a new submission stamped with the current time
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self {
            document_type: Self::DOCUMENT_TYPE.to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
            submitted_at: Utc::now(),
            status: SubmissionStatus::New,
        }
    }
}

/// Tags: an array of strings; anything else counts as "no tags"
fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(label) if !label.trim().is_empty() => Some(label),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Category: a non-empty string; anything else counts as uncategorized
fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(label)) if !label.trim().is_empty() => Some(label),
        _ => None,
    })
}
