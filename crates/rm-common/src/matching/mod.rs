pub mod ranker;
pub mod scoring;
pub mod skills;
pub mod weights;

pub use ranker::{RankError, Ranker, RankerConfig};
pub use scoring::{InvalidEmbeddingError, MatchResult, MatchScorer, recommendation_from_score};
pub use skills::{SkillOverlap, compute_skill_overlap};
pub use weights::{DEFAULT_WEIGHTS, MatchWeights};
