/// Category derivation and client-side filtering
use crate::listing::ListRecord;
use std::collections::{HashMap, HashSet};

/// Synthetic category selecting every record
pub const ALL_CATEGORY: &str = "All";

/// `"All"` followed by each distinct label in first-seen order
pub fn derive_categories<R: ListRecord>(records: &[R]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut categories = vec![ALL_CATEGORY.to_string()];
    seen.insert(ALL_CATEGORY);

    for record in records {
        for label in record.labels() {
            if seen.insert(label) {
                categories.push(label.to_string());
            }
        }
    }

    categories
}

/// Records visible under `category`
pub fn filter_records<R: ListRecord>(records: &[R], category: &str) -> Vec<R> {
    if category == ALL_CATEGORY {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| record.has_label(category))
        .cloned()
        .collect()
}

/// Render keys: the record id when present and unique in `records`,
/// otherwise `<prefix>-<position>`
pub fn render_keys<R: ListRecord>(records: &[R]) -> Vec<String> {
    let mut id_counts: HashMap<&str, usize> = HashMap::new();
    for id in records.iter().filter_map(|record| record.record_id()) {
        *id_counts.entry(id).or_default() += 1;
    }

    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record.record_id() {
            Some(id) if !id.is_empty() && id_counts.get(id) == Some(&1) => id.to_string(),
            _ => format!("{}-{}", R::KEY_PREFIX, index),
        })
        .collect()
}
