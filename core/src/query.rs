//! Fuzzy multi-field relevance search over the published index snapshot.
//!
//! Each query n-gram is expanded to the indexed n-grams of a field that lie within the
//! automatic edit-distance threshold for its length. For a given query n-gram, field and
//! document only the strongest expansion counts:
//!
//! `strength = 0.5^distance * (1 + ln min(tf_query, tf_doc))`, multiplied by the field weight.
//!
//! Capping the document's term frequency at the query's keeps a field that merely repeats
//! the query grams from outscoring a field that is exactly the query.
//!
//! Per-field contributions are summed into the document score. Results are ordered by
//! score descending, then document id ascending.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

use crate::analyzer::tokenize;
use crate::error::{Result, SearchError};
use crate::fuzzy::{auto_threshold, bounded_distance, match_strength};
use crate::ingest::IndexHandle;
use crate::{DocId, Document, Field, FieldWeights, InvertedIndex, Posting};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub document: Document,
    pub score: f32,
}

/// Read side of the engine. Cheap to clone; every clone queries the same handle.
#[derive(Clone)]
pub struct QueryEngine {
    handle: IndexHandle,
    weights: FieldWeights,
}

impl QueryEngine {
    pub fn new(handle: IndexHandle, weights: FieldWeights) -> Self {
        Self { handle, weights }
    }

    /// Rank every matching document. Blank input is [`SearchError::InvalidQuery`]; no
    /// matches is an empty vector.
    pub fn search(&self, query_text: &str) -> Result<Vec<Hit>> {
        if query_text.trim().is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        let snapshot = self.handle.snapshot();
        let mut tokens: BTreeMap<String, u32> = BTreeMap::new();
        for token in tokenize(query_text) {
            *tokens.entry(token).or_insert(0) += 1;
        }
        let scores = score_documents(&snapshot, &tokens, &self.weights);

        let mut ranked: Vec<(DocId, f32)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        debug!(query = query_text, tokens = tokens.len(), hits = ranked.len(), "search");

        let mut hits = Vec::with_capacity(ranked.len());
        for (doc_id, score) in ranked {
            match snapshot.get_document(doc_id) {
                Ok(document) => hits.push(Hit { document: document.clone(), score }),
                Err(e) => error!(doc_id, error = %e, "posting references a missing document; skipping"),
            }
        }
        Ok(hits)
    }

    /// [`search`](Self::search) truncated to the first `limit` hits.
    pub fn search_with_limit(&self, query_text: &str, limit: usize) -> Result<Vec<Hit>> {
        let mut hits = self.search(query_text)?;
        hits.truncate(limit);
        Ok(hits)
    }
}

fn tf_weight(term_frequency: u32) -> f32 {
    if term_frequency > 0 { 1.0 + (term_frequency as f32).ln() } else { 0.0 }
}

/// Indexed terms of `field` within the automatic threshold of `token`, with their distance.
fn expand<'a>(index: &'a InvertedIndex, field: Field, token: &str) -> Vec<(usize, &'a [Posting])> {
    let max = auto_threshold(token.chars().count());
    if max == 0 {
        let postings = index.postings(token, field);
        return if postings.is_empty() { Vec::new() } else { vec![(0, postings)] };
    }
    index
        .terms(field)
        .filter_map(|(term, postings)| bounded_distance(token, term, max).map(|d| (d, postings)))
        .collect()
}

fn score_documents(index: &InvertedIndex, tokens: &BTreeMap<String, u32>, weights: &FieldWeights) -> HashMap<DocId, f32> {
    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for field in Field::ALL {
        let weight = weights.get(field);
        if weight <= 0.0 {
            continue;
        }
        for (token, &query_tf) in tokens {
            let mut best: HashMap<DocId, f32> = HashMap::new();
            for (distance, postings) in expand(index, field, token) {
                let strength = match_strength(distance);
                for p in postings {
                    let s = strength * tf_weight(p.term_frequency.min(query_tf));
                    let slot = best.entry(p.doc_id).or_insert(0.0);
                    if s > *slot {
                        *slot = s;
                    }
                }
            }
            for (doc_id, s) in best {
                *scores.entry(doc_id).or_insert(0.0) += s * weight;
            }
        }
    }
    scores
}
