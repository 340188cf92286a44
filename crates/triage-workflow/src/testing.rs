//! Test doubles for the completion service and the vector index.

use std::collections::VecDeque;
use std::sync::Mutex;

use triage_core::{Category, SegmentDocument, SegmentMetadata, StoreStatus, StoredSegment};
use triage_llm::{Completer, CompletionParams, LlmError};

use crate::index::Index;

/// Completion service that answers by prompt kind: a fixed classification
/// label, numbered drafts, and a queue of review verdicts (`YES` once the
/// queue runs dry). `None` makes that kind of call fail.
pub struct RoutedCompleter {
    label: Option<String>,
    draft_ok: bool,
    verdicts: Mutex<VecDeque<Option<String>>>,
    drafts: Mutex<usize>,
    reviews: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
}

impl RoutedCompleter {
    pub fn new(label: Option<&str>, verdicts: &[Option<&str>]) -> Self {
        Self {
            label: label.map(str::to_string),
            draft_ok: true,
            verdicts: Mutex::new(verdicts.iter().map(|v| v.map(str::to_string)).collect()),
            drafts: Mutex::new(0),
            reviews: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails.
    pub fn unavailable() -> Self {
        Self {
            draft_ok: false,
            ..Self::new(None, &[None, None, None])
        }
    }

    pub fn drafts(&self) -> usize {
        *self.drafts.lock().unwrap()
    }

    pub fn reviews(&self) -> usize {
        *self.reviews.lock().unwrap()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

fn unavailable() -> LlmError {
    LlmError::Server {
        status: 503,
        body: "unavailable".into(),
    }
}

#[async_trait::async_trait]
impl Completer for RoutedCompleter {
    async fn complete(&self, prompt: &str, _params: CompletionParams) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.starts_with("You are an intelligent support ticket classifier") {
            return self.label.clone().ok_or_else(unavailable);
        }
        if prompt.starts_with("You are a customer support agent") {
            let mut drafts = self.drafts.lock().unwrap();
            *drafts += 1;
            return if self.draft_ok {
                Ok(format!("Draft {drafts}"))
            } else {
                Err(unavailable())
            };
        }
        if prompt.starts_with("Review if this response is relevant") {
            *self.reviews.lock().unwrap() += 1;
            return match self.verdicts.lock().unwrap().pop_front() {
                Some(Some(verdict)) => Ok(verdict),
                Some(None) => Err(unavailable()),
                None => Ok("YES".into()),
            };
        }
        Err(unavailable())
    }
}

/// Index that records calls and answers queries with canned segments.
#[derive(Default)]
pub struct RecordingIndex {
    hits: Vec<String>,
    stored: Mutex<Vec<(Category, Vec<SegmentDocument>)>>,
    queries: Mutex<Vec<(Category, String, usize)>>,
}

impl RecordingIndex {
    pub fn with_hits(hits: &[&str]) -> Self {
        Self {
            hits: hits.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<(Category, Vec<SegmentDocument>)> {
        self.stored.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(Category, String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Index for RecordingIndex {
    async fn store(&self, category: Category, documents: Vec<SegmentDocument>) -> StoreStatus {
        let count = documents.len();
        self.stored.lock().unwrap().push((category, documents));
        StoreStatus::Stored { count, category }
    }

    async fn query(&self, category: Category, text: &str, k: usize) -> Vec<StoredSegment> {
        self.queries
            .lock()
            .unwrap()
            .push((category, text.to_string(), k));
        self.hits
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, content)| StoredSegment {
                content: content.clone(),
                metadata: SegmentMetadata {
                    ticket_id: format!("past-{i}"),
                    subject: "Past ticket".into(),
                    category,
                    chunk_index: 0,
                    total_chunks: 1,
                },
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }
}
