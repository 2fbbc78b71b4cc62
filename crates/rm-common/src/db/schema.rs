/// rm.resumes: full resume records as JSONB, keyed by ULID.
pub const RESUMES_DDL: &str = r#"
CREATE SCHEMA IF NOT EXISTS rm;

CREATE TABLE IF NOT EXISTS rm.resumes (
    id VARCHAR(26) PRIMARY KEY,
    record JSONB NOT NULL,
    content_hash VARCHAR(16) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_resumes_content_hash ON rm.resumes(content_hash);
CREATE INDEX IF NOT EXISTS idx_resumes_created_at ON rm.resumes(created_at DESC);
"#;

/// rm.jobs: full job records as JSONB, keyed by ULID.
pub const JOBS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS rm.jobs (
    id VARCHAR(26) PRIMARY KEY,
    record JSONB NOT NULL,
    content_hash VARCHAR(16) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_jobs_content_hash ON rm.jobs(content_hash);
CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON rm.jobs(created_at DESC);
"#;

/// rm.match_results: explicit ranking snapshots.
/// UNIQUE per (match_run_id, job_id, resume_id) so a retried run cannot
/// double-insert, while separate runs on the same day both record.
pub const MATCH_RESULTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS rm.match_results (
    id BIGSERIAL PRIMARY KEY,
    job_id VARCHAR(26) NOT NULL,
    resume_id VARCHAR(26) NOT NULL,

    -- run instance id (ULID, generated once per process)
    match_run_id VARCHAR(64) NOT NULL,

    overall_score DOUBLE PRECISION NOT NULL,
    score_breakdown JSONB NOT NULL,
    matching_skills JSONB,
    missing_skills JSONB,
    recommendation VARCHAR(20) NOT NULL,
    explanation TEXT,

    engine_version VARCHAR(20),

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT match_results_unique_run_pair UNIQUE (match_run_id, job_id, resume_id)
);

CREATE INDEX IF NOT EXISTS idx_match_results_job_score
  ON rm.match_results(job_id, overall_score DESC, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_match_results_resume ON rm.match_results(resume_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_match_results_run ON rm.match_results(match_run_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resumes_schema_covers_lookup_columns() {
        for required in [
            "rm.resumes",
            "id VARCHAR(26) PRIMARY KEY",
            "record JSONB NOT NULL",
            "content_hash",
            "idx_resumes_content_hash",
        ] {
            assert!(RESUMES_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn jobs_schema_covers_lookup_columns() {
        for required in ["rm.jobs", "record JSONB NOT NULL", "idx_jobs_content_hash"] {
            assert!(JOBS_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn match_results_schema_contains_indexes_and_unique() {
        for required in [
            "job_id",
            "resume_id",
            "match_run_id VARCHAR(64) NOT NULL",
            "score_breakdown JSONB NOT NULL",
            "recommendation",
            "match_results_unique_run_pair",
            "UNIQUE (match_run_id, job_id, resume_id)",
            "idx_match_results_job_score",
            "idx_match_results_resume",
            "idx_match_results_run",
        ] {
            assert!(MATCH_RESULTS_DDL.contains(required), "missing: {required}");
        }
    }
}
