//! Pipeline data types.

use crate::types::RetrievedDocument;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Key under which the unexpanded question is stored.
pub const ORIGINAL_QUERY_KEY: &str = "query_0";

/// The original question plus its reformulations, in query order.
///
/// `query_0` is always present and always first. Serializes as a JSON object
/// whose key order matches query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedQuerySet {
    entries: Vec<(String, String)>,
}

impl ExpandedQuerySet {
    /// A set holding only the original question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            entries: vec![(ORIGINAL_QUERY_KEY.to_string(), question.into())],
        }
    }

    /// Append a reformulation. A duplicate key replaces the earlier value.
    pub(crate) fn push(&mut self, key: impl Into<String>, query: impl Into<String>) {
        let key = key.into();
        let query = query.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = query,
            None => self.entries.push((key, query)),
        }
    }

    /// The unexpanded question.
    pub fn original(&self) -> &str {
        &self.entries[0].1
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true; `query_0` is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in query order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Query strings in query order.
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for ExpandedQuerySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, query) in &self.entries {
            map.serialize_entry(key, query)?;
        }
        map.end()
    }
}

/// Outcome of judging one excerpt against the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceJudgment {
    Relevant,
    NotRelevant,
}

impl RelevanceJudgment {
    /// Parse a model's label. Only the first line is considered.
    ///
    /// Accepts `relevant`/`yes`/`true` and `not_relevant`/`not relevant`/
    /// `irrelevant`/`no`/`false`, case-insensitively and ignoring surrounding
    /// quotes or punctuation.
    pub fn parse(label: &str) -> Option<Self> {
        let first_line = label.trim().lines().next().unwrap_or_default();
        let lowered = first_line
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        let first_word = lowered
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or_default();
        let normalized = lowered.replace(['-', ' '], "_");

        if normalized.starts_with("not_relevant")
            || normalized.starts_with("irrelevant")
            || matches!(first_word, "no" | "false")
        {
            Some(Self::NotRelevant)
        } else if normalized.starts_with("relevant") || matches!(first_word, "yes" | "true") {
            Some(Self::Relevant)
        } else {
            None
        }
    }

    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevant => "relevant",
            Self::NotRelevant => "not_relevant",
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RagResponse {
    /// Correlation id shared by every log line of the run
    pub request_id: String,

    /// Generated answer, exactly as the model produced it
    pub answer: String,

    /// Queries sent to the retriever
    pub queries: ExpandedQuerySet,

    /// Excerpts used as context, in merge order
    pub documents: Vec<RetrievedDocument>,

    /// Excerpts dropped by the relevance filter
    pub filtered_out: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_set_starts_with_original() {
        let mut set = ExpandedQuerySet::new("What regions does the service support?");
        set.push("query_1", "region support");
        set.push("query_2", "supported regions");

        assert_eq!(set.len(), 3);
        assert_eq!(set.original(), "What regions does the service support?");
        assert_eq!(
            set.keys().collect::<Vec<_>>(),
            vec!["query_0", "query_1", "query_2"]
        );
        assert_eq!(set.get("query_2"), Some("supported regions"));
    }

    #[test]
    fn test_query_set_serializes_in_order() {
        let mut set = ExpandedQuerySet::new("q");
        set.push("query_2", "b");
        set.push("query_10", "c");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"query_0":"q","query_2":"b","query_10":"c"}"#);
    }

    #[test]
    fn test_duplicate_key_replaces() {
        let mut set = ExpandedQuerySet::new("q");
        set.push("query_1", "a");
        set.push("query_1", "b");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("query_1"), Some("b"));
    }

    #[test]
    fn test_judgment_parsing() {
        assert_eq!(
            RelevanceJudgment::parse("relevant"),
            Some(RelevanceJudgment::Relevant)
        );
        assert_eq!(
            RelevanceJudgment::parse(" \"Relevant\".\nThe excerpt lists regions."),
            Some(RelevanceJudgment::Relevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("not_relevant"),
            Some(RelevanceJudgment::NotRelevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("Not relevant"),
            Some(RelevanceJudgment::NotRelevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("IRRELEVANT"),
            Some(RelevanceJudgment::NotRelevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("yes"),
            Some(RelevanceJudgment::Relevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("Yes."),
            Some(RelevanceJudgment::Relevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("TRUE"),
            Some(RelevanceJudgment::Relevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("no"),
            Some(RelevanceJudgment::NotRelevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("No, it covers pricing."),
            Some(RelevanceJudgment::NotRelevant)
        );
        assert_eq!(
            RelevanceJudgment::parse("false"),
            Some(RelevanceJudgment::NotRelevant)
        );
        assert_eq!(RelevanceJudgment::parse("nothing"), None);
        assert_eq!(RelevanceJudgment::parse("yesterday"), None);
        assert_eq!(RelevanceJudgment::parse("maybe"), None);
        assert_eq!(RelevanceJudgment::parse(""), None);
    }

    #[test]
    fn test_judgment_serialization() {
        let json = serde_json::to_string(&RelevanceJudgment::NotRelevant).unwrap();
        assert_eq!(json, "\"not_relevant\"");
    }
}
