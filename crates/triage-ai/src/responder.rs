//! Drafting the reply to a ticket from its content and similar past tickets.

use std::sync::Arc;

use tracing::{info, warn};
use triage_core::{Category, StoredSegment, TicketRecord};
use triage_llm::{Completer, CompletionParams};

/// Reply stored when drafting fails.
pub const FALLBACK_RESPONSE: &str = "We apologize, but there was an issue. Please try again later.";
/// Identity every drafted reply signs off with.
pub const SIGN_OFF: &str = "Customer Support Agent";

const NO_CONTEXT: &str = "No similar previous tickets found. Using general knowledge.\n";
const PARAMS: CompletionParams = CompletionParams::new(0.1, 512);

pub struct ResponseGenerator {
    completer: Arc<dyn Completer>,
}

impl ResponseGenerator {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    /// Draft a reply. Never empty: failures and blank replies become
    /// [`FALLBACK_RESPONSE`].
    pub async fn draft(
        &self,
        subject: &str,
        description: &str,
        category: Category,
        similar: &[StoredSegment],
    ) -> String {
        let prompt = response_prompt(&build_context(similar), subject, description, category);
        match self.completer.complete(&prompt, PARAMS).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                warn!("completion returned an empty reply, using fallback response");
                FALLBACK_RESPONSE.to_string()
            }
            Err(e) => {
                warn!(error = %e, "response generation failed, using fallback response");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }

    /// Draft (or re-draft) the record's response in place.
    pub async fn generate_response(&self, record: &mut TicketRecord) {
        let response = self
            .draft(
                &record.subject,
                &record.description,
                record.category_or_default(),
                &record.similar_tickets,
            )
            .await;
        info!(
            attempt = record.regeneration_attempts,
            chars = response.len(),
            "drafted response"
        );
        record.response = Some(response);
    }
}

/// Context block listing similar tickets, or a notice that there are none.
pub fn build_context(similar: &[StoredSegment]) -> String {
    if similar.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut context = String::from("Information from similar previous tickets:\n\n");
    for segment in similar {
        context.push_str(&format!("Content: {}\n---\n", segment.content));
    }
    context
}

fn response_prompt(
    context: &str,
    subject: &str,
    description: &str,
    category: Category,
) -> String {
    format!(
        "You are a customer support agent. Based on the context and your knowledge,
provide a helpful and professional response.

Context:
{context}

Ticket:
Subject: {subject}
Description: {description}
Category: {category}

Guidelines:
1. Be empathetic and professional
2. If relevant solutions exist in the context, use them
3. If the ticket is vague, ask for clarification
4. Keep it concise (3-4 sentences)
5. Sign off with \"{SIGN_OFF}\"

Response:
"
    )
}
