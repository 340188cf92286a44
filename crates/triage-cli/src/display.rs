//! Human-readable output for processed tickets and store queries.

use std::path::Path;

use triage_core::{Category, StoredSegment, TicketRecord};

const MAX_SNIPPET_CHARS: usize = 160;

// ── Public API ──

/// Print a processed ticket as a vertical card grouped by workflow stage.
pub fn print_ticket_card(record: &TicketRecord) {
    println!("=== {} ===", record.subject);
    println!("{}", record.description);
    println!();

    println!("Classification");
    print_field("ticket_id", record.ticket_id.as_deref().unwrap_or("-"));
    print_field("category", record.category_or_default());
    match record.category_confidence {
        Some(c) => print_field("confidence", format!("{c:.2}")),
        None => print_field("confidence", "-"),
    }
    println!();

    println!("Indexing");
    print_field("chunks", record.chunks.len());
    match &record.vector_store_status {
        Some(status) => print_field("vector_store_status", status),
        None => print_field("vector_store_status", "-"),
    }
    println!();

    if !record.similar_tickets.is_empty() {
        println!("Similar Tickets");
        for segment in &record.similar_tickets {
            print_segment(segment);
        }
        println!();
    }

    println!("Review");
    print_field("review", record.review.as_str());
    print_field("regeneration_attempts", record.regeneration_attempts);
    println!();

    println!("Response");
    for line in record.response.as_deref().unwrap_or_default().lines() {
        println!("  {line}");
    }
}

pub fn print_search_results(category: Category, hits: &[StoredSegment]) {
    if hits.is_empty() {
        println!("No segments found in {} ({})", category, category.collection());
        return;
    }

    println!("{} results from {}", hits.len(), category.collection());
    for segment in hits {
        print_segment(segment);
    }
}

pub fn print_stats(base: &Path, counts: &[(Category, usize)]) {
    println!("Vector stores under {}", base.display());
    for (category, count) in counts {
        println!("  {:<26} {}", category.collection(), count);
    }
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    println!("  {:<26} {}", "total", total);
}

// ── Rendering ──

fn print_field(name: &str, value: impl std::fmt::Display) {
    println!("  {:<26} {}", name, value);
}

fn print_segment(segment: &StoredSegment) {
    let meta = &segment.metadata;
    println!(
        "  [{:.3}] {} (chunk {}/{}) {}",
        segment.score,
        meta.ticket_id,
        meta.chunk_index + 1,
        meta.total_chunks,
        meta.subject
    );
    println!("         {}", snippet(&segment.content));
}

/// First line of `text`, cut to a fixed number of chars.
fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= MAX_SNIPPET_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(MAX_SNIPPET_CHARS).collect();
    format!("{cut}...")
}
