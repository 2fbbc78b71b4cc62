use serde::{Deserialize, Serialize};

use crate::matching::MatchResult;

/// Query parameters for candidate ranking.
#[derive(Debug, Clone, Deserialize)]
pub struct RankQuery {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Overrides the configured oversample factor for this call.
    #[serde(default)]
    pub oversample: Option<usize>,
    /// Persist the run as a match_results snapshot.
    #[serde(default)]
    pub persist: bool,
}

fn default_top_k() -> usize {
    10
}

impl Default for RankQuery {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            oversample: None,
            persist: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankResponse {
    pub job_id: String,
    pub match_run_id: String,
    pub results: Vec<MatchResult>,
}

/// Score one explicit (job, resume) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    pub job_id: String,
    pub resume_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_query_defaults() {
        let query: RankQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.top_k, 10);
        assert!(query.oversample.is_none());
        assert!(!query.persist);
    }
}
