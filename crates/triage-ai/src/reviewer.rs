//! Relevance review of drafted responses and the regeneration decision.
//!
//! A record moves `Unreviewed -> Passed | Rejected`. Each rejection spends
//! one regeneration attempt; once two are spent the current draft is kept
//! as-is. Review fails open: if the service cannot be reached the draft
//! passes.

use std::sync::Arc;

use tracing::{info, warn};
use triage_core::{ReviewStatus, TicketRecord};
use triage_llm::{Completer, CompletionParams};

/// Rejections after which the current draft is accepted as final.
pub const MAX_REGENERATION_ATTEMPTS: u8 = 2;

const PARAMS: CompletionParams = CompletionParams::new(0.1, 256);

/// Where the workflow goes after a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Regenerate,
    End,
}

/// `End` once the draft passed or the attempt budget is spent.
pub fn should_regenerate(record: &TicketRecord) -> Decision {
    if review_settled(record) {
        Decision::End
    } else {
        Decision::Regenerate
    }
}

fn review_settled(record: &TicketRecord) -> bool {
    record.review == ReviewStatus::Passed
        || record.regeneration_attempts >= MAX_REGENERATION_ATTEMPTS
}

pub struct Reviewer {
    completer: Arc<dyn Completer>,
}

impl Reviewer {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    /// Review the record's current response in place.
    ///
    /// No-op once the draft passed or the attempt budget is spent.
    pub async fn review_response(&self, record: &mut TicketRecord) {
        if review_settled(record) {
            return;
        }

        let prompt = review_prompt(
            &record.subject,
            &record.description,
            record.response.as_deref().unwrap_or_default(),
        );

        match self.completer.complete(&prompt, PARAMS).await {
            Ok(reply) if reply.to_uppercase().contains("YES") => {
                record.review = ReviewStatus::Passed;
                info!(attempts = record.regeneration_attempts, "response passed review");
            }
            Ok(reply) => {
                record.review = ReviewStatus::Rejected;
                record.regeneration_attempts += 1;
                info!(
                    attempts = record.regeneration_attempts,
                    reply = %reply.trim(),
                    "response rejected by review"
                );
            }
            Err(e) => {
                warn!(error = %e, "review failed, accepting response");
                record.review = ReviewStatus::Passed;
            }
        }
    }
}

fn review_prompt(subject: &str, description: &str, response: &str) -> String {
    format!(
        "Review if this response is relevant to the ticket.

Ticket Subject: {subject}
Ticket Description: {description}
Generated Response: {response}

Return ONLY 'YES' if the response is appropriate, otherwise 'NO'.
"
    )
}
