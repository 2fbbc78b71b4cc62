use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::skills::compute_skill_overlap;
use super::weights::MatchWeights;
use crate::embedding::{Embedding, cosine_similarity};
use crate::{JobRecord, ResumeRecord};

/// The pair cannot be scored with the vectors at hand. Callers ranking a
/// batch drop the affected candidate and continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEmbeddingError {
    #[error("{side} embedding is missing")]
    Missing { side: &'static str },
    #[error("{side} embedding has zero dimension")]
    Empty { side: &'static str },
    #[error("embedding dimension mismatch: job={job} resume={resume}")]
    DimensionMismatch { job: usize, resume: usize },
}

/// One scored (job, resume) pair. Created fresh per query; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: String,
    pub resume_id: String,
    pub candidate_name: String,
    pub skills_match_score: f64,
    pub experience_match_score: f64,
    pub semantic_similarity_score: f64,
    pub overall_score: f64,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub explanation: String,
    pub recommendation: String,
}

/// Recommendation label derived from the overall score.
pub fn recommendation_from_score(score: f64) -> &'static str {
    if score >= 0.8 {
        "STRONG_MATCH"
    } else if score >= 0.6 {
        "GOOD_MATCH"
    } else if score >= 0.4 {
        "PARTIAL_MATCH"
    } else {
        "WEAK_MATCH"
    }
}

pub struct MatchScorer {
    weights: MatchWeights,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(MatchWeights::default())
    }
}

impl MatchScorer {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    /// Score one (job, resume) pair from precomputed embeddings.
    ///
    /// Semantic convention: every embedder in this workspace L2-normalizes its
    /// output, so the raw cosine is used directly and clamped to [0, 1]. There
    /// is no distance-to-similarity conversion anywhere in the pipeline.
    pub fn score(
        &self,
        job: &JobRecord,
        resume: &ResumeRecord,
        job_embedding: &Embedding,
        resume_embedding: &Embedding,
    ) -> Result<MatchResult, InvalidEmbeddingError> {
        validate_pair(job_embedding, resume_embedding)?;

        let semantic = (cosine_similarity(&job_embedding.vector, &resume_embedding.vector) as f64)
            .clamp(0.0, 1.0);

        let overlap = compute_skill_overlap(&job.required_skills, &resume.skills.technical);

        let experience =
            experience_score(job.required_experience_years, resume.experience.total_years);

        let overall = self.weights.blend(overlap.score, experience, semantic);

        let explanation =
            build_explanation(semantic, overlap.score, experience, &overlap.matched);

        Ok(MatchResult {
            job_id: job.id.clone(),
            resume_id: resume.id.clone(),
            candidate_name: resume.display_name().to_string(),
            skills_match_score: overlap.score,
            experience_match_score: experience,
            semantic_similarity_score: semantic,
            overall_score: overall,
            matching_skills: overlap.matched,
            missing_skills: overlap.missing,
            explanation,
            recommendation: recommendation_from_score(overall).to_string(),
        })
    }
}

fn validate_pair(
    job: &Embedding,
    resume: &Embedding,
) -> Result<(), InvalidEmbeddingError> {
    if job.vector.is_empty() {
        return Err(InvalidEmbeddingError::Empty { side: "job" });
    }
    if resume.vector.is_empty() {
        return Err(InvalidEmbeddingError::Empty { side: "resume" });
    }
    if job.vector.len() != resume.vector.len() {
        return Err(InvalidEmbeddingError::DimensionMismatch {
            job: job.vector.len(),
            resume: resume.vector.len(),
        });
    }
    Ok(())
}

/// 1.0 when the posting states no requirement, otherwise the capped ratio of
/// candidate years to required years.
fn experience_score(required_years: Option<f64>, candidate_years: f64) -> f64 {
    match required_years {
        None => 1.0,
        Some(required) if required <= 0.0 => 1.0,
        Some(required) => (candidate_years / required).clamp(0.0, 1.0),
    }
}

fn build_explanation(
    semantic: f64,
    skills: f64,
    experience: f64,
    matched_skills: &[String],
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if semantic >= 0.8 {
        parts.push(format!("High semantic similarity ({semantic:.2})"));
    } else if semantic >= 0.6 {
        parts.push(format!("Good semantic similarity ({semantic:.2})"));
    } else {
        parts.push(format!("Moderate semantic similarity ({semantic:.2})"));
    }

    if matched_skills.is_empty() {
        parts.push("No direct skill matches found".to_string());
    } else {
        let mut shown = matched_skills
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if matched_skills.len() > 5 {
            shown.push_str(&format!(" and {} more", matched_skills.len() - 5));
        }
        parts.push(format!("Matched skills: {shown}"));
        parts.push(format!("Skills score: {skills:.2}"));
    }

    if experience >= 0.8 {
        parts.push("Meets experience requirements".to_string());
    } else if experience > 0.0 {
        parts.push(format!("Partial experience match ({experience:.2})"));
    }

    parts.join(". ") + "."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingSource;
    use crate::{Experience, JobRecord, Profile, ResumeRecord, Skills};

    fn embedding(vector: Vec<f32>, source: EmbeddingSource) -> Embedding {
        Embedding::new(vector, source)
    }

    fn job(required_skills: &[&str], years: Option<f64>) -> JobRecord {
        JobRecord {
            id: "job-1".into(),
            title: "Backend Engineer".into(),
            required_skills: required_skills.iter().map(|s| s.to_string()).collect(),
            required_experience_years: years,
            ..JobRecord::default()
        }
    }

    fn resume(id: &str, skills: &[&str], years: f64) -> ResumeRecord {
        ResumeRecord {
            id: id.into(),
            profile: Profile {
                name: Some(format!("Candidate {id}")),
                ..Profile::default()
            },
            experience: Experience {
                total_years: years,
                ..Experience::default()
            },
            skills: Skills {
                technical: skills.iter().map(|s| s.to_string()).collect(),
                ..Skills::default()
            },
            ..ResumeRecord::default()
        }
    }

    #[test]
    fn worked_example_candidate_a() {
        // cos([1,0], [0.8,0.6]) = 0.8
        let job_rec = job(&["Python", "AWS"], Some(3.0));
        let resume_rec = resume("a", &["python", "aws", "Docker"], 5.0);
        let job_emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);
        let resume_emb = embedding(vec![0.8, 0.6], EmbeddingSource::Resume);

        let result = MatchScorer::default()
            .score(&job_rec, &resume_rec, &job_emb, &resume_emb)
            .unwrap();

        assert_eq!(result.skills_match_score, 1.0);
        assert_eq!(result.experience_match_score, 1.0);
        assert!((result.semantic_similarity_score - 0.8).abs() < 1e-6);
        assert!((result.overall_score - 0.94).abs() < 1e-6);
        assert_eq!(result.recommendation, "STRONG_MATCH");
    }

    #[test]
    fn worked_example_candidate_b() {
        // cos([1,0], [0.6,0.8]) = 0.6
        let job_rec = job(&["Python", "AWS"], Some(3.0));
        let resume_rec = resume("b", &["Python"], 1.0);
        let job_emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);
        let resume_emb = embedding(vec![0.6, 0.8], EmbeddingSource::Resume);

        let result = MatchScorer::default()
            .score(&job_rec, &resume_rec, &job_emb, &resume_emb)
            .unwrap();

        assert!((result.skills_match_score - 0.5).abs() < 1e-9);
        assert!((result.experience_match_score - 1.0 / 3.0).abs() < 1e-9);
        assert!((result.semantic_similarity_score - 0.6).abs() < 1e-6);
        assert!((result.overall_score - 0.48).abs() < 1e-6);
    }

    #[test]
    fn sub_scores_stay_in_unit_interval() {
        // Anti-aligned vectors produce a negative cosine; the semantic score
        // must clamp to zero rather than go negative.
        let job_rec = job(&["Rust"], Some(10.0));
        let resume_rec = resume("c", &[], 0.0);
        let job_emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);
        let resume_emb = embedding(vec![-1.0, 0.0], EmbeddingSource::Resume);

        let result = MatchScorer::default()
            .score(&job_rec, &resume_rec, &job_emb, &resume_emb)
            .unwrap();

        for score in [
            result.skills_match_score,
            result.experience_match_score,
            result.semantic_similarity_score,
            result.overall_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
        }
        assert_eq!(result.semantic_similarity_score, 0.0);
    }

    #[test]
    fn vacuous_skill_requirement_scores_one() {
        let job_rec = job(&[], Some(3.0));
        let resume_rec = resume("d", &[], 3.0);
        let emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);

        let result = MatchScorer::default()
            .score(&job_rec, &resume_rec, &emb, &emb.clone())
            .unwrap();

        assert_eq!(result.skills_match_score, 1.0);
    }

    #[test]
    fn unset_or_zero_experience_requirement_scores_one() {
        let resume_rec = resume("e", &[], 0.0);
        let emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);
        let scorer = MatchScorer::default();

        let unset = scorer
            .score(&job(&[], None), &resume_rec, &emb, &emb.clone())
            .unwrap();
        assert_eq!(unset.experience_match_score, 1.0);

        let zero = scorer
            .score(&job(&[], Some(0.0)), &resume_rec, &emb, &emb.clone())
            .unwrap();
        assert_eq!(zero.experience_match_score, 1.0);
    }

    #[test]
    fn matched_and_missing_union_covers_requirements() {
        let job_rec = job(&["Python", "AWS", "Terraform"], None);
        let resume_rec = resume("f", &["python"], 2.0);
        let emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);

        let result = MatchScorer::default()
            .score(&job_rec, &resume_rec, &emb, &emb.clone())
            .unwrap();

        let mut union = result.matching_skills.clone();
        union.extend(result.missing_skills.clone());
        union.sort();
        let mut expected = job_rec.required_skills.clone();
        expected.sort();
        assert_eq!(union, expected);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let job_rec = job(&[], None);
        let resume_rec = resume("g", &[], 1.0);
        let job_emb = embedding(vec![1.0, 0.0, 0.0], EmbeddingSource::Job);
        let resume_emb = embedding(vec![1.0, 0.0], EmbeddingSource::Resume);

        let err = MatchScorer::default()
            .score(&job_rec, &resume_rec, &job_emb, &resume_emb)
            .unwrap_err();
        assert_eq!(
            err,
            InvalidEmbeddingError::DimensionMismatch { job: 3, resume: 2 }
        );
    }

    #[test]
    fn empty_vectors_are_an_error() {
        let job_rec = job(&[], None);
        let resume_rec = resume("h", &[], 1.0);
        let empty = embedding(vec![], EmbeddingSource::Job);
        let ok = embedding(vec![1.0], EmbeddingSource::Resume);

        let err = MatchScorer::default()
            .score(&job_rec, &resume_rec, &empty, &ok)
            .unwrap_err();
        assert_eq!(err, InvalidEmbeddingError::Empty { side: "job" });
    }

    #[test]
    fn explanation_lists_top_skills_and_overflow() {
        let job_rec = job(
            &["Python", "AWS", "Docker", "Terraform", "Kafka", "Redis"],
            Some(2.0),
        );
        let resume_rec = resume(
            "i",
            &["python", "aws", "docker", "terraform", "kafka", "redis"],
            4.0,
        );
        let emb = embedding(vec![1.0, 0.0], EmbeddingSource::Job);

        let result = MatchScorer::default()
            .score(&job_rec, &resume_rec, &emb, &emb.clone())
            .unwrap();

        assert!(result.explanation.contains("and 1 more"));
        assert!(result.explanation.contains("Meets experience requirements"));
    }

    #[test]
    fn recommendation_thresholds() {
        assert_eq!(recommendation_from_score(0.94), "STRONG_MATCH");
        assert_eq!(recommendation_from_score(0.7), "GOOD_MATCH");
        assert_eq!(recommendation_from_score(0.48), "PARTIAL_MATCH");
        assert_eq!(recommendation_from_score(0.1), "WEAK_MATCH");
    }
}
