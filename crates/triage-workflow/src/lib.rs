//! Ticket-processing workflow: a fixed pipeline of stages over one
//! [`TicketRecord`](triage_core::TicketRecord), with a bounded
//! draft/review loop at the end.
//!
//! ```text
//! classify -> chunk -> store_vectors -> find_similar -> generate_response -> review_response
//!                                                            ^                    |
//!                                                            +---- regenerate ----+
//! ```

pub mod index;
pub mod orchestrator;
pub mod stage;
pub mod stages;

#[cfg(test)]
mod testing;

pub use index::{Index, VectorIndex};
pub use orchestrator::{Run, Workflow, process_ticket};
pub use stage::{Stage, next};
