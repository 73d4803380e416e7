//! Merging of per-query retrieval results.

use crate::types::RetrievedDocument;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Concatenate result lists in query order and drop duplicate excerpts.
///
/// Two excerpts are duplicates when their whitespace-normalized content is
/// equal. The first occurrence keeps its position and takes the highest score
/// seen for that content.
pub fn merge_results(batches: Vec<Vec<RetrievedDocument>>) -> Vec<RetrievedDocument> {
    let mut merged: Vec<RetrievedDocument> = Vec::new();
    let mut positions: HashMap<Vec<u8>, usize> = HashMap::new();

    for doc in batches.into_iter().flatten() {
        let key = content_key(&doc.content);
        match positions.get(&key) {
            Some(&index) => {
                let kept = &mut merged[index];
                kept.score = max_score(kept.score, doc.score);
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(doc);
            }
        }
    }

    merged
}

fn content_key(content: &str) -> Vec<u8> {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ");
    Sha256::digest(normalized.as_bytes()).to_vec()
}

fn max_score(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
