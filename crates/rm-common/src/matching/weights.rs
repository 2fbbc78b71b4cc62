/// Default blend for the overall score.
/// Skills dominate; experience and semantic similarity share the rest.
pub const DEFAULT_WEIGHTS: MatchWeights = MatchWeights {
    skills: 0.40,
    experience: 0.30,
    semantic: 0.30,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub skills: f64,
    pub experience: f64,
    pub semantic: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.semantic
    }

    /// The overall score is exactly this weighted sum; no hidden state.
    pub fn blend(&self, skills: f64, experience: f64, semantic: f64) -> f64 {
        self.skills * skills + self.experience * experience + self.semantic * semantic
    }

    /// Reads `RM_WEIGHT_SKILLS` / `RM_WEIGHT_EXPERIENCE` / `RM_WEIGHT_SEMANTIC`,
    /// falling back to the defaults per component.
    pub fn from_env() -> Self {
        fn read(key: &str, default: f64) -> f64 {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        Self {
            skills: read("RM_WEIGHT_SKILLS", DEFAULT_WEIGHTS.skills),
            experience: read("RM_WEIGHT_EXPERIENCE", DEFAULT_WEIGHTS.experience),
            semantic: read("RM_WEIGHT_SEMANTIC", DEFAULT_WEIGHTS.semantic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_matches_documented_blend() {
        assert_eq!(DEFAULT_WEIGHTS.skills, 0.40);
        assert_eq!(DEFAULT_WEIGHTS.experience, 0.30);
        assert_eq!(DEFAULT_WEIGHTS.semantic, 0.30);
    }

    #[test]
    fn blend_is_the_exact_weighted_sum_over_the_unit_cube() {
        // Walk a grid of sub-score combinations; the blend must equal the
        // formula bit-for-bit and stay inside [0, 1].
        let steps = [0.0, 0.05, 0.25, 1.0 / 3.0, 0.5, 0.75, 0.99, 1.0];
        for &s in &steps {
            for &e in &steps {
                for &m in &steps {
                    let overall = DEFAULT_WEIGHTS.blend(s, e, m);
                    assert_eq!(overall, 0.4 * s + 0.3 * e + 0.3 * m);
                    assert!((0.0..=1.0).contains(&overall));
                }
            }
        }
    }
}
