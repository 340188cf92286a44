//! The ticket record threaded through the workflow, and its category labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::segment::{StoreStatus, StoredSegment};

/// Support ticket category.
///
/// The declaration order is also the precedence used when matching a free-text
/// label: Billing, then Technical, then Security, then General.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Billing,
    Technical,
    Security,
    #[default]
    General,
}

impl Category {
    /// All categories in matching precedence order.
    pub const ALL: [Category; 4] = [
        Category::Billing,
        Category::Technical,
        Category::Security,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "Billing",
            Self::Technical => "Technical",
            Self::Security => "Security",
            Self::General => "General",
        }
    }

    /// Lower-cased name, used as the on-disk partition directory.
    pub fn partition(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Technical => "technical",
            Self::Security => "security",
            Self::General => "general",
        }
    }

    /// Collection (table) name inside the category partition.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Billing => "billing_tickets",
            Self::Technical => "technical_tickets",
            Self::Security => "security_tickets",
            Self::General => "general_tickets",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Exact, case-insensitive parse of a category name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Outcome of the most recent review of the drafted response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// No review has run yet.
    #[default]
    Unreviewed,
    Passed,
    Rejected,
}

impl ReviewStatus {
    /// Tri-state view: `None` before the first review.
    pub fn passed(&self) -> Option<bool> {
        match self {
            Self::Unreviewed => None,
            Self::Passed => Some(true),
            Self::Rejected => Some(false),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreviewed => "unreviewed",
            Self::Passed => "passed",
            Self::Rejected => "rejected",
        }
    }
}

/// A single support ticket as it moves through the workflow.
///
/// `subject` and `description` are fixed at creation. Every other field is
/// owned by exactly one stage, which writes it in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketRecord {
    pub subject: String,
    pub description: String,
    /// Assigned once by the chunk stage; never replaced afterwards.
    pub ticket_id: Option<String>,
    pub category: Option<Category>,
    pub category_confidence: Option<f32>,
    pub chunks: Vec<String>,
    pub vector_store_status: Option<StoreStatus>,
    pub similar_tickets: Vec<StoredSegment>,
    pub response: Option<String>,
    pub review: ReviewStatus,
    pub regeneration_attempts: u8,
}

impl TicketRecord {
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Full text used for chunking and indexing.
    pub fn content(&self) -> String {
        format!(
            "Subject: {}\n\nDescription: {}",
            self.subject, self.description
        )
    }

    /// Free-text query used to find similar tickets.
    pub fn query_text(&self) -> String {
        format!("{} {}", self.subject, self.description)
    }

    /// Assigned category, or General when classification has not run.
    pub fn category_or_default(&self) -> Category {
        self.category.unwrap_or_default()
    }
}
