/// In-process content store
///
/// Evaluates the collection queries the views issue against documents held in
/// memory. Used for local development (optionally seeded from a JSON file) and
/// as the store double in tests, with call counters and failure injection.
use crate::content::{ContentClient, ContentError, DocumentQuery, SortDirection};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::Mutex;

pub struct InMemoryContentStore {
    documents: Mutex<Vec<Value>>,
    fetch_calls: AtomicU64,
    create_calls: AtomicU64,
    fail_fetches: AtomicBool,
    fail_creates: AtomicBool,
    latency: Duration,
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryContentStore {
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            documents: Mutex::new(documents),
            fetch_calls: AtomicU64::new(0),
            create_calls: AtomicU64::new(0),
            fail_fetches: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
            latency: Duration::ZERO,
        }
    }

    /// Load documents from a JSON array on disk
    pub async fn from_seed_file(path: &Path) -> std::io::Result<Self> {
        let raw = tokio::fs::read(path).await?;
        let documents: Vec<Value> = serde_json::from_slice(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(documents))
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(AtomicOrdering::SeqCst)
    }

    /// Snapshot of every stored document
    pub async fn documents(&self) -> Vec<Value> {
        self.documents.lock().await.clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ContentClient for InMemoryContentStore {
    async fn fetch(&self, query: &str) -> Result<Vec<Value>, ContentError> {
        self.fetch_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.simulate_latency().await;

        if self.fail_fetches.load(AtomicOrdering::SeqCst) {
            return Err(ContentError::Transport("injected fetch failure".to_string()));
        }

        let query = DocumentQuery::parse(query)
            .ok_or_else(|| ContentError::Query(query.to_string()))?;

        let documents = self.documents.lock().await;
        let mut matched: Vec<Value> = documents
            .iter()
            .filter(|doc| doc.get("_type").and_then(Value::as_str) == Some(query.document_type.as_str()))
            .cloned()
            .collect();
        drop(documents);

        if let Some((field, direction)) = &query.order {
            // Stable sort keeps store order among equal keys
            matched.sort_by(|a, b| {
                let ordering = compare_fields(a.get(field), b.get(field));
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        if !query.projection.is_empty() {
            matched = matched
                .into_iter()
                .map(|doc| project_fields(doc, &query.projection))
                .collect();
        }

        Ok(matched)
    }

    async fn create(&self, mut document: Value) -> Result<Value, ContentError> {
        self.create_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.simulate_latency().await;

        if self.fail_creates.load(AtomicOrdering::SeqCst) {
            return Err(ContentError::Transport("injected create failure".to_string()));
        }

        let object = document
            .as_object_mut()
            .ok_or_else(|| ContentError::InvalidDocument("document must be an object".to_string()))?;
        if object.get("_type").and_then(Value::as_str).is_none() {
            return Err(ContentError::InvalidDocument("document is missing _type".to_string()));
        }
        object
            .entry("_id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        object.insert("_createdAt".to_string(), Value::String(Utc::now().to_rfc3339()));

        self.documents.lock().await.push(document.clone());
        Ok(document)
    }

    fn backend_tag(&self) -> &'static str {
        "memory"
    }
}

/// Missing and null sort after every present value
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project_fields(document: Value, fields: &[String]) -> Value {
    match document {
        Value::Object(mut object) => {
            let mut projected = Map::new();
            for field in fields {
                if let Some(value) = object.remove(field) {
                    projected.insert(field.clone(), value);
                }
            }
            Value::Object(projected)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn seeded() -> InMemoryContentStore {
        InMemoryContentStore::new(vec![
            json!({ "_type": "skills", "_id": "s2", "name": "TypeScript" }),
            json!({ "_type": "project", "_id": "p1", "title": "Old", "_createdAt": "2023-01-01T00:00:00Z", "tags": ["Web"] }),
            json!({ "_type": "skills", "_id": "s1", "name": "Rust" }),
            json!({ "_type": "project", "_id": "p2", "title": "New", "_createdAt": "2024-01-01T00:00:00Z", "secret": true }),
        ])
    }

    #[tokio::test]
    async fn test_fetch_filters_and_orders() {
        let store = seeded();

        let skills = store.fetch(r#"*[_type == "skills"] | order(name asc)"#).await.unwrap();
        let names: Vec<_> = skills.iter().map(|s| s["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Rust", "TypeScript"]);

        let projects = store
            .fetch(r#"*[_type == "project"] | order(_createdAt desc) { _id, title, tags }"#)
            .await
            .unwrap();
        assert_eq!(projects[0]["_id"], "p2");
        assert!(projects[0].get("secret").is_none());
        assert_eq!(projects[1]["tags"], json!(["Web"]));
        assert_eq!(store.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_query() {
        let store = seeded();
        let result = store.fetch("count(*)").await;
        assert!(matches!(result, Err(ContentError::Query(_))));
    }

    #[tokio::test]
    async fn test_create_assigns_identity() {
        let store = InMemoryContentStore::default();
        let created = store
            .create(json!({ "_type": "contact", "name": "Jo" }))
            .await
            .unwrap();

        assert!(created["_id"].is_string());
        assert!(created["_createdAt"].is_string());
        assert_eq!(store.create_calls(), 1);
        assert_eq!(store.documents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_untyped_document() {
        let store = InMemoryContentStore::default();
        let result = store.create(json!({ "name": "Jo" })).await;
        assert!(matches!(result, Err(ContentError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = seeded();
        store.set_fail_fetches(true);
        store.set_fail_creates(true);

        assert!(store.fetch(r#"*[_type == "skills"]"#).await.is_err());
        assert!(store.create(json!({ "_type": "contact" })).await.is_err());
        assert_eq!(store.fetch_calls(), 1);
        assert_eq!(store.create_calls(), 1);
        assert!(store.documents().await.len() == 4);
    }

    #[tokio::test]
    async fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "_type": "skills", "name": "Go" }}]"#).unwrap();

        let store = InMemoryContentStore::from_seed_file(file.path()).await.unwrap();
        let skills = store.fetch(r#"*[_type == "skills"]"#).await.unwrap();
        assert_eq!(skills.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_file_must_be_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "_type": "skills" }}"#).unwrap();

        let result = InMemoryContentStore::from_seed_file(file.path()).await;
        assert_eq!(result.err().map(|e| e.kind()), Some(std::io::ErrorKind::InvalidData));
    }
}
