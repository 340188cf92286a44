//! Workflow stages and the transition function between them.

use std::fmt;

use triage_ai::{Decision, should_regenerate};
use triage_core::TicketRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Chunk,
    StoreVectors,
    FindSimilar,
    GenerateResponse,
    ReviewResponse,
}

impl Stage {
    pub const FIRST: Stage = Stage::Classify;

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Chunk => "chunk",
            Stage::StoreVectors => "store_vectors",
            Stage::FindSimilar => "find_similar",
            Stage::GenerateResponse => "generate_response",
            Stage::ReviewResponse => "review_response",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The stage after `stage`, or `None` when the workflow is done.
///
/// Every edge is unconditional except the one out of review, which loops
/// back to drafting while the response is rejected and attempts remain.
pub fn next(stage: Stage, record: &TicketRecord) -> Option<Stage> {
    match stage {
        Stage::Classify => Some(Stage::Chunk),
        Stage::Chunk => Some(Stage::StoreVectors),
        Stage::StoreVectors => Some(Stage::FindSimilar),
        Stage::FindSimilar => Some(Stage::GenerateResponse),
        Stage::GenerateResponse => Some(Stage::ReviewResponse),
        Stage::ReviewResponse => match should_regenerate(record) {
            Decision::Regenerate => Some(Stage::GenerateResponse),
            Decision::End => None,
        },
    }
}
