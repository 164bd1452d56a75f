//! Search engine configuration

use serde::{Deserialize, Serialize};

/// Multi-page search collection bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum result pages fetched per query
    pub max_pages: usize,
    /// Stop collecting once at least max(raw_candidate_floor, 4 * limit)
    /// raw candidates have been gathered
    pub raw_candidate_floor: usize,
    /// Absolute cap on raw candidates collected across all pages
    pub hard_candidate_cap: usize,
    /// Result limit applied when a request does not specify one
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_pages: 8,
            raw_candidate_floor: 120,
            hard_candidate_cap: 400,
            default_limit: 50,
        }
    }
}

impl SearchConfig {
    /// Raw candidates to gather before ranking for a given result limit
    pub fn raw_target(&self, limit: usize) -> usize {
        self.raw_candidate_floor.max(4 * limit)
    }
}
