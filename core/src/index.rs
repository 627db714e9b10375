//! In-memory inverted index over the analyzed record fields.
//!
//! Maps `(field, token)` to a postings list (document id + term frequency) and owns the
//! document bodies used to materialize results.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::analyzer::tokenize;
use crate::error::{Result, SearchError};
use crate::{DocId, Document, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Occurrences of the token in this document's field.
    pub term_frequency: u32,
}

#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    postings: [HashMap<String, Vec<Posting>>; 3], // one dictionary per Field, postings sorted by doc_id
    docs: BTreeMap<DocId, Document>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Analyze every field of `document` and store it. Re-putting an existing id replaces
    /// its previous postings.
    pub fn put(&mut self, document: Document) {
        if self.docs.contains_key(&document.id) {
            self.remove_postings(document.id);
        }
        for field in Field::ALL {
            let mut tf_counts: HashMap<String, u32> = HashMap::new();
            for token in tokenize(document.text(field)) {
                *tf_counts.entry(token).or_insert(0) += 1;
            }
            let dictionary = &mut self.postings[field.slot()];
            for (token, term_frequency) in tf_counts {
                let list = dictionary.entry(token).or_default();
                let at = list.partition_point(|p| p.doc_id < document.id);
                list.insert(at, Posting { doc_id: document.id, term_frequency });
            }
        }
        self.docs.insert(document.id, document);
    }

    /// Document ids whose `field` contains `token`; empty when the token is unknown.
    pub fn lookup(&self, token: &str, field: Field) -> Vec<DocId> {
        self.postings(token, field).iter().map(|p| p.doc_id).collect()
    }

    pub fn postings(&self, token: &str, field: Field) -> &[Posting] {
        self.postings[field.slot()].get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every indexed token of `field` with its postings, in no particular order.
    pub fn terms(&self, field: Field) -> impl Iterator<Item = (&str, &[Posting])> + '_ {
        self.postings[field.slot()].iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    pub fn get_document(&self, id: DocId) -> Result<&Document> {
        self.docs.get(&id).ok_or(SearchError::NotFound(id))
    }

    /// Stored documents in id order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.docs.values()
    }

    pub fn clear(&mut self) {
        for dictionary in self.postings.iter_mut() {
            dictionary.clear();
        }
        self.docs.clear();
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn term_count(&self, field: Field) -> usize { self.postings[field.slot()].len() }

    fn remove_postings(&mut self, doc_id: DocId) {
        for dictionary in self.postings.iter_mut() {
            dictionary.retain(|_, list| {
                list.retain(|p| p.doc_id != doc_id);
                !list.is_empty()
            });
        }
    }
}
