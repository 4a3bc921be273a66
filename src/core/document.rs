//! Documents and their frontmatter metadata

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Frontmatter of a single document.
///
/// Values are never interpreted here, only copied, moved and deleted. A key
/// mapped to `null` or `""` is still present: `contains` and `get` keep the
/// two cases apart. Keys keep the order they were read or inserted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(Map<String, Value>);

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or replace a value, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a key without disturbing the order of the others
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl From<Map<String, Value>> for Frontmatter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Frontmatter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A markdown document tracked by the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path relative to the opened base directory, with a leading `/`
    pub relative_path: String,
    /// Parsed frontmatter block
    pub frontmatter: Frontmatter,
    /// Whether the frontmatter has changes not yet written back
    pub modified: bool,
}

impl Document {
    /// Create a clean document from freshly read frontmatter
    pub fn new(relative_path: impl Into<String>, frontmatter: Frontmatter) -> Self {
        Self {
            relative_path: relative_path.into(),
            frontmatter,
            modified: false,
        }
    }

    /// File name shown in lists (last path segment)
    pub fn title(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_empty_values_count_as_present() {
        let mut fm = Frontmatter::new();
        fm.set("draft", Value::Null);
        fm.set("title", json!(""));

        assert!(fm.contains("draft"));
        assert!(fm.contains("title"));
        assert_eq!(fm.get("draft"), Some(&Value::Null));
        assert!(!fm.contains("tags"));
        assert_eq!(fm.get("tags"), None);
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut fm: Frontmatter = [("title".to_string(), json!("A"))].into_iter().collect();
        assert_eq!(fm.remove("title"), Some(json!("A")));
        assert_eq!(fm.remove("title"), None);
        assert!(fm.is_empty());
    }

    #[test]
    fn keys_keep_insertion_order_across_removal() {
        let mut fm: Frontmatter = [
            ("title".to_string(), json!("A")),
            ("date".to_string(), json!("2024-05-01")),
            ("author".to_string(), json!("Bob")),
            ("draft".to_string(), json!(false)),
        ]
        .into_iter()
        .collect();

        fm.remove("date");
        fm.set("slug", json!("a"));
        let keys: Vec<&str> = fm.keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "author", "draft", "slug"]);
    }

    #[test]
    fn title_is_last_segment() {
        let doc = Document::new("/posts/2024/hello.md", Frontmatter::new());
        assert_eq!(doc.title(), "hello.md");
        assert!(!doc.modified);
    }
}
