//! Drives one ticket through the stage graph.

use std::sync::Arc;

use tracing::{Instrument, info, info_span};
use triage_ai::{Classifier, ResponseGenerator, Reviewer};
use triage_core::{TextSplitter, TicketRecord};
use triage_llm::Completer;

use crate::index::Index;
use crate::stage::{Stage, next};
use crate::stages;

/// A finished workflow run: the final record and the stages executed, in order.
#[derive(Debug, Clone)]
pub struct Run {
    pub record: TicketRecord,
    pub stages: Vec<Stage>,
}

pub struct Workflow {
    classifier: Classifier,
    generator: ResponseGenerator,
    reviewer: Reviewer,
    index: Arc<dyn Index>,
    splitter: TextSplitter,
}

impl Workflow {
    pub fn new(completer: Arc<dyn Completer>, index: Arc<dyn Index>, splitter: TextSplitter) -> Self {
        Self {
            classifier: Classifier::new(completer.clone()),
            generator: ResponseGenerator::new(completer.clone()),
            reviewer: Reviewer::new(completer),
            index,
            splitter,
        }
    }

    /// Process a new ticket from its subject and description.
    pub async fn process_ticket(
        &self,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> TicketRecord {
        self.run(TicketRecord::new(subject, description)).await.record
    }

    /// Run the workflow to completion. Never fails: stage problems are
    /// recorded in the returned record.
    pub async fn run(&self, record: TicketRecord) -> Run {
        let span = info_span!("ticket", subject = %record.subject);
        self.drive(record).instrument(span).await
    }

    async fn drive(&self, mut record: TicketRecord) -> Run {
        let mut executed = Vec::new();
        let mut stage = Some(Stage::FIRST);

        while let Some(current) = stage {
            self.execute(current, &mut record).await;
            executed.push(current);
            stage = next(current, &record);
        }

        info!(
            ticket_id = record.ticket_id.as_deref().unwrap_or_default(),
            category = %record.category_or_default(),
            chunks = record.chunks.len(),
            similar = record.similar_tickets.len(),
            review = record.review.as_str(),
            attempts = record.regeneration_attempts,
            stages = executed.len(),
            "ticket processed"
        );

        Run {
            record,
            stages: executed,
        }
    }

    async fn execute(&self, stage: Stage, record: &mut TicketRecord) {
        match stage {
            Stage::Classify => self.classifier.classify_ticket(record).await,
            Stage::Chunk => stages::chunk_ticket(record, &self.splitter),
            Stage::StoreVectors => stages::store_vectors(record, self.index.as_ref()).await,
            Stage::FindSimilar => stages::find_similar(record, self.index.as_ref()).await,
            Stage::GenerateResponse => self.generator.generate_response(record).await,
            Stage::ReviewResponse => self.reviewer.review_response(record).await,
        }
    }
}

/// Process a new ticket through `workflow`. See [`Workflow::process_ticket`].
pub async fn process_ticket(
    workflow: &Workflow,
    subject: impl Into<String>,
    description: impl Into<String>,
) -> TicketRecord {
    workflow.process_ticket(subject, description).await
}
