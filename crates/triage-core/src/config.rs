//! Retrieval configuration shared by the splitter and the vector stores.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ticket::Category;

pub const DEFAULT_VECTOR_DB_BASE_PATH: &str = "./vector_stores";
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Root directory holding one partition per category.
    pub vector_db_base_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            vector_db_base_path: PathBuf::from(DEFAULT_VECTOR_DB_BASE_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl RagConfig {
    /// Directory of the given category's partition: `<base>/<lowercase category>`.
    pub fn partition_path(&self, category: Category) -> PathBuf {
        partition_path(&self.vector_db_base_path, category)
    }
}

pub fn partition_path(base: &Path, category: Category) -> PathBuf {
    base.join(category.partition())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_path_is_lowercase_category() {
        let config = RagConfig {
            vector_db_base_path: PathBuf::from("/data/stores"),
            ..Default::default()
        };
        assert_eq!(
            config.partition_path(Category::Billing),
            PathBuf::from("/data/stores/billing")
        );
    }
}
