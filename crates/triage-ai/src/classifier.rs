//! Ticket category classification.
//!
//! The completion service proposes a `Category:confidence` label; a local
//! vagueness heuristic and a confidence threshold can override it to
//! General. Classification never fails: if the service is unavailable the
//! ticket becomes General with confidence 0.5.

use std::sync::Arc;

use tracing::{info, warn};
use triage_core::{Category, TicketRecord};
use triage_llm::{Completer, CompletionParams};

/// Phrases that mark a ticket as too vague to route confidently.
pub const VAGUE_KEYWORDS: [&str; 9] = [
    "thing",
    "stuff",
    "problem",
    "issue",
    "not working",
    "help",
    "fix",
    "broken",
    "doesn't work",
];

/// Distinct vague keywords needed to call a ticket vague.
pub const VAGUE_KEYWORD_HITS: usize = 2;
/// Descriptions shorter than this many words are vague.
pub const MIN_DESCRIPTION_WORDS: usize = 5;
/// Labels below this confidence are routed to General.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;
/// Confidence used when the reply carries none, or classification failed.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

const PARAMS: CompletionParams = CompletionParams::new(0.1, 512);

/// Final category decision for one ticket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub confidence: f32,
}

impl Classification {
    fn fallback() -> Self {
        Self {
            category: Category::General,
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

/// Completion-backed ticket classifier.
pub struct Classifier {
    completer: Arc<dyn Completer>,
}

impl Classifier {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    /// Classify a ticket. Total: service failures yield (General, 0.5).
    pub async fn classify(&self, subject: &str, description: &str) -> Classification {
        let prompt = classification_prompt(subject, description);
        let reply = match self.completer.complete(&prompt, PARAMS).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "classification failed, defaulting to General");
                return Classification::fallback();
            }
        };

        let (label, confidence) = parse_label(&reply);
        let Some(category) = match_category(&label) else {
            warn!(reply = %reply, "unrecognised category label, defaulting to General");
            return Classification::fallback();
        };

        if confidence < CONFIDENCE_THRESHOLD || is_vague(subject, description) {
            return Classification {
                category: Category::General,
                confidence,
            };
        }

        Classification {
            category,
            confidence,
        }
    }

    /// Classify the record in place, setting category and confidence.
    pub async fn classify_ticket(&self, record: &mut TicketRecord) {
        let result = self.classify(&record.subject, &record.description).await;
        info!(
            category = %result.category,
            confidence = result.confidence,
            "classified ticket"
        );
        record.category = Some(result.category);
        record.category_confidence = Some(result.confidence);
    }
}

/// Whether a ticket is too vague to trust a specific category.
///
/// Vague when at least two distinct keywords appear (case-insensitive
/// substring of subject or description), or the description has fewer than
/// five words.
pub fn is_vague(subject: &str, description: &str) -> bool {
    let subject = subject.to_lowercase();
    let description = description.to_lowercase();

    let hits = VAGUE_KEYWORDS
        .iter()
        .filter(|kw| subject.contains(*kw) || description.contains(*kw))
        .count();

    hits >= VAGUE_KEYWORD_HITS || description.split_whitespace().count() < MIN_DESCRIPTION_WORDS
}

/// Split a `Category:confidence` reply into its label and confidence.
///
/// Without a `:` the whole reply is the label. A missing or unparseable
/// confidence becomes 0.5; parsed values are clamped into [0, 1].
pub fn parse_label(reply: &str) -> (String, f32) {
    let reply = reply.trim();
    let mut parts = reply.split(':');
    let label = parts.next().unwrap_or_default();

    match parts.next() {
        Some(raw) => {
            let confidence = raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(FALLBACK_CONFIDENCE);
            (label.trim().to_string(), confidence)
        }
        None => (reply.to_string(), FALLBACK_CONFIDENCE),
    }
}

/// First category (in Billing, Technical, Security, General order) whose name
/// occurs in the label.
pub fn match_category(label: &str) -> Option<Category> {
    Category::ALL
        .into_iter()
        .find(|c| label.contains(c.as_str()))
}

fn classification_prompt(subject: &str, description: &str) -> String {
    format!(
        "You are an intelligent support ticket classifier.
Read the ticket subject and description, then classify it into EXACTLY one of:

1. Billing - payments, invoices, refunds, subscriptions
2. Technical - product features, errors, bugs, integrations
3. Security - login issues, suspicious access, data breaches
4. General - vague or unrelated requests

Rules:
- Use General if the ticket is vague or ambiguous
- Return ONLY the category and your confidence, like \"Technical:0.9\"

Subject: {subject}
Description: {description}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompleter;

    fn classifier(completer: &Arc<ScriptedCompleter>) -> Classifier {
        Classifier::new(completer.clone())
    }

    const CLEAR_SUBJECT: &str = "Refund for duplicate charge";
    const CLEAR_DESCRIPTION: &str = "My credit card was charged twice for the March invoice";

    #[test]
    fn vague_by_keywords() {
        assert!(is_vague(
            "Just a quick question",
            "Something isn't working and I need help figuring it out."
        ));
        assert!(is_vague("Broken stuff", "The export page throws an error on save"));
    }

    #[test]
    fn single_keyword_is_not_vague() {
        assert!(!is_vague("Export", "The export page has an issue when saving reports"));
    }

    #[test]
    fn vague_by_short_description() {
        assert!(is_vague("Invoice", "Wrong amount charged"));
        assert!(!is_vague(CLEAR_SUBJECT, CLEAR_DESCRIPTION));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(is_vague("HELP", "My STUFF disappeared from the dashboard overnight"));
    }

    #[test]
    fn parse_label_variants() {
        assert_eq!(parse_label("Technical:0.9"), ("Technical".to_string(), 0.9));
        assert_eq!(parse_label("  Billing : 0.75 "), ("Billing".to_string(), 0.75));
        assert_eq!(parse_label("Security"), ("Security".to_string(), 0.5));
        assert_eq!(parse_label("Billing:high"), ("Billing".to_string(), 0.5));
        assert_eq!(parse_label("Billing:7"), ("Billing".to_string(), 1.0));
        assert_eq!(parse_label("Billing:-2"), ("Billing".to_string(), 0.0));
    }

    #[test]
    fn match_category_precedence() {
        assert_eq!(match_category("Technical"), Some(Category::Technical));
        assert_eq!(match_category("Category Security"), Some(Category::Security));
        assert_eq!(
            match_category("Technical or Billing"),
            Some(Category::Billing)
        );
        assert_eq!(match_category("technical"), None);
        assert_eq!(match_category("Refunds"), None);
    }

    #[tokio::test]
    async fn confident_clear_ticket_keeps_label() {
        let completer = Arc::new(ScriptedCompleter::replying("Billing:0.92"));
        let result = classifier(&completer)
            .classify(CLEAR_SUBJECT, CLEAR_DESCRIPTION)
            .await;
        assert_eq!(result.category, Category::Billing);
        assert!((result.confidence - 0.92).abs() < 1e-6);

        let calls = completer.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains(CLEAR_DESCRIPTION));
        assert_eq!(calls[0].1, CompletionParams::new(0.1, 512));
    }

    #[tokio::test]
    async fn low_confidence_forces_general_and_keeps_confidence() {
        let completer = Arc::new(ScriptedCompleter::replying("Technical:0.65"));
        let result = classifier(&completer)
            .classify(CLEAR_SUBJECT, CLEAR_DESCRIPTION)
            .await;
        assert_eq!(result.category, Category::General);
        assert!((result.confidence - 0.65).abs() < 1e-6);
    }

    #[tokio::test]
    async fn short_description_forces_general() {
        let completer = Arc::new(ScriptedCompleter::replying("Security:0.99"));
        let result = classifier(&completer).classify("Login", "Locked out again").await;
        assert_eq!(result.category, Category::General);
        assert!((result.confidence - 0.99).abs() < 1e-6);
    }

    #[tokio::test]
    async fn vague_ticket_is_general_whatever_the_label() {
        let completer = Arc::new(ScriptedCompleter::replying("Technical:0.95"));
        let result = classifier(&completer)
            .classify(
                "Just a quick question",
                "Something isn't working and I need help figuring it out.",
            )
            .await;
        assert_eq!(result.category, Category::General);
    }

    #[tokio::test]
    async fn unknown_label_falls_back() {
        let completer = Arc::new(ScriptedCompleter::replying("Shipping:0.9"));
        let result = classifier(&completer)
            .classify(CLEAR_SUBJECT, CLEAR_DESCRIPTION)
            .await;
        assert_eq!(result, Classification::fallback());
    }

    #[tokio::test]
    async fn label_without_confidence_is_below_threshold() {
        let completer = Arc::new(ScriptedCompleter::replying("Billing"));
        let result = classifier(&completer)
            .classify(CLEAR_SUBJECT, CLEAR_DESCRIPTION)
            .await;
        assert_eq!(result.category, Category::General);
        assert_eq!(result.confidence, 0.5);
    }

    #[tokio::test]
    async fn service_failure_falls_back() {
        let completer = Arc::new(ScriptedCompleter::failing());
        let mut record = TicketRecord::new(CLEAR_SUBJECT, CLEAR_DESCRIPTION);
        classifier(&completer).classify_ticket(&mut record).await;
        assert_eq!(record.category, Some(Category::General));
        assert_eq!(record.category_confidence, Some(0.5));
    }
}
