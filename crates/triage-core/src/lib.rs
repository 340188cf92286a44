pub mod config;
pub mod schema;
pub mod segment;
pub mod splitter;
pub mod ticket;

pub use config::RagConfig;
pub use segment::{SegmentDocument, SegmentMetadata, StoreStatus, StoredSegment};
pub use splitter::{SplitterError, TextSplitter};
pub use ticket::{Category, ReviewStatus, TicketRecord};
