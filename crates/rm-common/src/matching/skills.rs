use std::collections::HashMap;

use crate::skill_normalizer::{normalize_skill, normalize_skill_set};

/// Outcome of comparing a job's required skills against a candidate's
/// technical skills. Matched/missing entries keep the job's original
/// spelling so their union always reproduces the requirement list.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillOverlap {
    pub score: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Required-skill overlap, case-insensitive and alias-folded.
///
/// Conventions:
/// - no required skills → vacuous 1.0 with empty matched/missing
/// - required skills present but candidate has none → 0.0, everything missing
/// - duplicate requirements that normalize to the same skill count once
pub fn compute_skill_overlap(required: &[String], candidate: &[String]) -> SkillOverlap {
    // First original spelling per normalized requirement; insertion order kept
    // for stable matched/missing output.
    let mut originals: Vec<(String, String)> = Vec::new();
    let mut seen: HashMap<String, ()> = HashMap::new();
    for skill in required {
        if skill.trim().is_empty() {
            continue;
        }
        let key = normalize_skill(skill);
        if seen.insert(key.clone(), ()).is_none() {
            originals.push((key, skill.trim().to_string()));
        }
    }

    if originals.is_empty() {
        return SkillOverlap {
            score: 1.0,
            matched: Vec::new(),
            missing: Vec::new(),
        };
    }

    let candidate_set = normalize_skill_set(candidate);
    if candidate_set.is_empty() {
        return SkillOverlap {
            score: 0.0,
            matched: Vec::new(),
            missing: originals.into_iter().map(|(_, orig)| orig).collect(),
        };
    }

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for (key, original) in originals {
        if candidate_set.contains(&key) {
            matched.push(original);
        } else {
            missing.push(original);
        }
    }

    let total = matched.len() + missing.len();
    SkillOverlap {
        score: matched.len() as f64 / total as f64,
        matched,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_requirements_match_vacuously() {
        let overlap = compute_skill_overlap(&[], &strings(&["rust"]));
        assert_eq!(overlap.score, 1.0);
        assert!(overlap.matched.is_empty());
        assert!(overlap.missing.is_empty());
    }

    #[test]
    fn empty_candidate_skills_score_zero() {
        let overlap = compute_skill_overlap(&strings(&["Python", "AWS"]), &[]);
        assert_eq!(overlap.score, 0.0);
        assert_eq!(overlap.missing, strings(&["Python", "AWS"]));
    }

    #[test]
    fn case_insensitive_matching() {
        let overlap = compute_skill_overlap(
            &strings(&["Python", "AWS"]),
            &strings(&["python", "aws", "Docker"]),
        );
        assert_eq!(overlap.score, 1.0);
        assert_eq!(overlap.matched, strings(&["Python", "AWS"]));
        assert!(overlap.missing.is_empty());
    }

    #[test]
    fn union_of_matched_and_missing_is_the_requirement_list() {
        let required = strings(&["Rust", "Kubernetes", "GraphQL"]);
        let overlap = compute_skill_overlap(&required, &strings(&["rust"]));

        let mut union = overlap.matched.clone();
        union.extend(overlap.missing.clone());
        union.sort();
        let mut expected = required.clone();
        expected.sort();
        assert_eq!(union, expected);
    }

    #[test]
    fn aliases_count_as_matches() {
        let overlap = compute_skill_overlap(
            &strings(&["JavaScript", "K8s"]),
            &strings(&["js", "kubernetes"]),
        );
        assert_eq!(overlap.score, 1.0);
    }

    #[test]
    fn duplicate_requirements_count_once() {
        let overlap = compute_skill_overlap(
            &strings(&["JS", "JavaScript", "Rust"]),
            &strings(&["javascript"]),
        );
        // js and JavaScript normalize to the same skill; denominator is 2.
        assert_eq!(overlap.score, 0.5);
        assert_eq!(overlap.matched, strings(&["JS"]));
        assert_eq!(overlap.missing, strings(&["Rust"]));
    }

    #[test]
    fn partial_overlap_scores_fractionally() {
        let overlap = compute_skill_overlap(
            &strings(&["Python", "AWS"]),
            &strings(&["Python"]),
        );
        assert!((overlap.score - 0.5).abs() < f64::EPSILON);
        assert_eq!(overlap.matched, strings(&["Python"]));
        assert_eq!(overlap.missing, strings(&["AWS"]));
    }
}
