//! The non-LLM stages: chunking, storing and retrieving segments.
//!
//! The completion-backed stages live in `triage_ai`; each stage here takes
//! the record by `&mut` and never fails, recording problems in the record.

use tracing::{debug, warn};
use triage_core::{SegmentDocument, StoreStatus, TextSplitter, TicketRecord};
use uuid::Uuid;

use crate::index::Index;

/// Similar segments retrieved per ticket.
pub const SIMILAR_TICKETS_K: usize = 3;

const MISSING_INPUT: &str = "Missing category or chunks";

/// Split the ticket content into chunks, assigning a ticket id if unset.
pub fn chunk_ticket(record: &mut TicketRecord, splitter: &TextSplitter) {
    if record.ticket_id.is_none() {
        record.ticket_id = Some(Uuid::new_v4().to_string());
    }
    record.chunks = splitter.split(&record.content());
    debug!(chunks = record.chunks.len(), "chunked ticket");
}

/// Embed and persist the record's chunks in its category partition.
pub async fn store_vectors(record: &mut TicketRecord, index: &dyn Index) {
    let (Some(category), false) = (record.category, record.chunks.is_empty()) else {
        warn!("nothing to store: {MISSING_INPUT}");
        record.vector_store_status = Some(StoreStatus::failed(MISSING_INPUT));
        return;
    };
    let Some(ticket_id) = record.ticket_id.as_deref() else {
        record.vector_store_status = Some(StoreStatus::failed("Missing ticket id"));
        return;
    };

    let documents =
        SegmentDocument::from_chunks(ticket_id, &record.subject, category, &record.chunks);
    record.vector_store_status = Some(index.store(category, documents).await);
}

/// Retrieve segments similar to the ticket from its category partition.
///
/// Runs after [`store_vectors`], so the ticket's own chunks may come back.
pub async fn find_similar(record: &mut TicketRecord, index: &dyn Index) {
    let Some(category) = record.category else {
        record.similar_tickets = vec![];
        return;
    };
    record.similar_tickets = index
        .query(category, &record.query_text(), SIMILAR_TICKETS_K)
        .await;
    debug!(found = record.similar_tickets.len(), "retrieved similar segments");
}
