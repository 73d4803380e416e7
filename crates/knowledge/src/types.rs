//! Retrieval result types.

use serde::{Deserialize, Serialize};

/// One excerpt returned by the retrieval backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Excerpt text
    pub content: String,

    /// Backend relevance score, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Opaque source location (bucket/URI/web page)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,

    /// Backend-specific metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl RetrievedDocument {
    /// Create a document with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            score: None,
            location: None,
            metadata: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_skips_absent_fields() {
        let doc = RetrievedDocument::new("Regions: us-east-1").with_score(0.42);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["content"], "Regions: us-east-1");
        assert_eq!(json["score"], 0.42);
        assert!(json.get("location").is_none());
        assert!(json.get("metadata").is_none());
    }
}
