pub mod cache;
pub mod llm;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{DocumentKind, Experience, Profile, Skills, Tools, Topics};

pub use cache::{ExtractionCache, content_hash};
pub use llm::{ExtractionError, LlmClient, LlmConfig};

/// Structured fields pulled from one resume. Missing fields default; a type
/// mismatch anywhere rejects the whole payload (fail closed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResumeFields {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub experience: Experience,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub topics: Topics,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub summary: String,
}

/// Structured fields pulled from one job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub required_experience_years: Option<f64>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl ResumeFields {
    /// Materialize a full record: fresh ULID, source text, creation time.
    pub fn into_record(self, source_text: &str) -> crate::ResumeRecord {
        crate::ResumeRecord {
            id: crate::run_id::generate(),
            profile: self.profile,
            experience: self.experience,
            skills: self.skills,
            topics: self.topics,
            tools: self.tools,
            summary: self.summary,
            source_text: source_text.to_string(),
            created_at: chrono::Utc::now(),
        }
    }
}

impl JobFields {
    pub fn into_record(self, source_text: &str) -> crate::JobRecord {
        crate::JobRecord {
            id: crate::run_id::generate(),
            title: self.title,
            company: self.company,
            required_skills: self.required_skills,
            preferred_skills: self.preferred_skills,
            required_experience_years: self.required_experience_years,
            responsibilities: self.responsibilities,
            summary: self.summary,
            source_text: source_text.to_string(),
            created_at: chrono::Utc::now(),
        }
    }
}

const RESUME_SYSTEM_PROMPT: &str = "You are an expert resume parser. \
Extract structured information from the resume text. \
Respond with a single JSON object and nothing else.";

const JOB_SYSTEM_PROMPT: &str = "You are an expert recruiter. \
Extract structured requirements from the job description text. \
Respond with a single JSON object and nothing else.";

pub fn build_resume_prompt(text: &str) -> String {
    format!(
        "Extract the following JSON from the resume below:\n\
        {{\n\
          \"profile\": {{\"name\": str|null, \"title\": str|null, \"email\": str|null, \"phone\": str|null, \"location\": str|null}},\n\
          \"experience\": {{\"total_years\": number, \"roles\": [str], \"companies\": [str], \"achievements\": [str]}},\n\
          \"skills\": {{\"technical\": [str], \"soft\": [str], \"certifications\": [str]}},\n\
          \"topics\": {{\"domains\": [str], \"specializations\": [str]}},\n\
          \"tools\": {{\"languages\": [str], \"frameworks\": [str], \"platforms\": [str]}},\n\
          \"summary\": str\n\
        }}\n\n\
        Resume:\n{text}"
    )
}

pub fn build_job_prompt(text: &str) -> String {
    format!(
        "Extract the following JSON from the job description below:\n\
        {{\n\
          \"title\": str,\n\
          \"company\": str|null,\n\
          \"required_skills\": [str],\n\
          \"preferred_skills\": [str],\n\
          \"required_experience_years\": number|null,\n\
          \"responsibilities\": [str],\n\
          \"summary\": str\n\
        }}\n\n\
        Job description:\n{text}"
    )
}

/// Pull the JSON object out of a completion that may be wrapped in prose or
/// markdown fences.
fn json_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Strict decode of an LLM completion. Any malformed payload yields None so
/// the caller substitutes defaults instead of trusting partial data.
pub fn decode_resume_fields(raw: &str) -> Option<ResumeFields> {
    serde_json::from_str(json_block(raw)?).ok()
}

pub fn decode_job_fields(raw: &str) -> Option<JobFields> {
    serde_json::from_str(json_block(raw)?).ok()
}

/// Skills the keyword fallback recognizes when the LLM path is unavailable.
const KNOWN_TECHNICAL_SKILLS: &[&str] = &[
    // Languages
    "python", "javascript", "typescript", "java", "c++", "c#", "php", "ruby", "go", "rust",
    "swift", "kotlin", "scala", "bash",
    // Web
    "html", "css", "react", "angular", "vue.js", "node.js", "express", "django", "flask",
    "fastapi", "spring", "laravel", "rails",
    // Databases
    "sql", "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "sqlite", "dynamodb",
    // Cloud and devops
    "aws", "azure", "gcp", "docker", "kubernetes", "terraform", "ansible", "jenkins", "git",
    "ci/cd",
    // Data and ML
    "pandas", "numpy", "scikit-learn", "tensorflow", "pytorch", "spark", "hadoop", "kafka",
    // Misc
    "linux", "rest api", "graphql", "microservices", "agile",
];

static EXPERIENCE_YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})\s*\+?\s*(?:years?|yrs?)").unwrap());

/// Scan for known skill keywords, preserving dictionary casing.
pub fn scan_known_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KNOWN_TECHNICAL_SKILLS
        .iter()
        .filter(|skill| lower.contains(*skill))
        .map(|skill| skill.to_string())
        .collect()
}

/// Largest plausible "N years" mention in the text, if any.
pub fn scan_experience_years(text: &str) -> Option<f64> {
    EXPERIENCE_YEARS_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter(|years| *years <= 50)
        .max()
        .map(f64::from)
}

/// Deterministic fallback when the LLM is disabled or failed. Yields a valid
/// but sparse record: keyword skills and a years guess, nothing else.
pub fn fallback_resume_fields(text: &str) -> ResumeFields {
    ResumeFields {
        experience: Experience {
            total_years: scan_experience_years(text).unwrap_or(0.0),
            ..Experience::default()
        },
        skills: Skills {
            technical: scan_known_skills(text),
            ..Skills::default()
        },
        ..ResumeFields::default()
    }
}

pub fn fallback_job_fields(text: &str) -> JobFields {
    JobFields {
        required_skills: scan_known_skills(text),
        required_experience_years: scan_experience_years(text),
        ..JobFields::default()
    }
}

/// Extraction front door: LLM when configured, keyword fallback otherwise,
/// results cached by content hash.
pub struct ExtractionPipeline {
    llm: Option<LlmClient>,
    cache: ExtractionCache,
}

impl ExtractionPipeline {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self {
            llm,
            cache: ExtractionCache::new(),
        }
    }

    /// Build from `LLM_*` env. A disabled LLM leaves only the fallback path.
    pub fn from_env() -> Self {
        let config = LlmConfig::from_env();
        if !config.enabled {
            return Self::new(None);
        }

        match LlmClient::new(config) {
            Ok(client) => Self::new(Some(client)),
            Err(err) => {
                warn!(error = %err, "llm client unavailable; extraction falls back to keywords");
                Self::new(None)
            }
        }
    }

    pub async fn extract_resume(&self, text: &str) -> ResumeFields {
        let hash = content_hash(text);
        if let Some(cached) = self.cache.get_resume(&hash).await {
            return cached;
        }

        let fields = match self.llm_completion(DocumentKind::Resume, text).await {
            Some(raw) => decode_resume_fields(&raw).unwrap_or_else(|| {
                warn!(content_hash = %hash, "malformed resume extraction; using fallback fields");
                fallback_resume_fields(text)
            }),
            None => fallback_resume_fields(text),
        };

        self.cache.put_resume(hash, fields.clone()).await;
        fields
    }

    pub async fn extract_job(&self, text: &str) -> JobFields {
        let hash = content_hash(text);
        if let Some(cached) = self.cache.get_job(&hash).await {
            return cached;
        }

        let fields = match self.llm_completion(DocumentKind::Job, text).await {
            Some(raw) => decode_job_fields(&raw).unwrap_or_else(|| {
                warn!(content_hash = %hash, "malformed job extraction; using fallback fields");
                fallback_job_fields(text)
            }),
            None => fallback_job_fields(text),
        };

        self.cache.put_job(hash, fields.clone()).await;
        fields
    }

    async fn llm_completion(&self, kind: DocumentKind, text: &str) -> Option<String> {
        let llm = self.llm.as_ref()?;

        let (system, prompt) = match kind {
            DocumentKind::Resume => (RESUME_SYSTEM_PROMPT, build_resume_prompt(text)),
            DocumentKind::Job => (JOB_SYSTEM_PROMPT, build_job_prompt(text)),
        };

        match llm.complete(system, &prompt).await {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!(kind = kind.as_str(), error = %err, "llm extraction failed; using fallback fields");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_resume_json() {
        let raw = r#"{
            "profile": {"name": "Dana Smith", "title": "Backend Engineer"},
            "experience": {"total_years": 6, "roles": ["Backend Engineer"]},
            "skills": {"technical": ["Rust", "PostgreSQL"]},
            "summary": "Systems-minded backend engineer."
        }"#;

        let fields = decode_resume_fields(raw).unwrap();
        assert_eq!(fields.profile.name.as_deref(), Some("Dana Smith"));
        assert_eq!(fields.experience.total_years, 6.0);
        assert_eq!(fields.skills.technical, vec!["Rust", "PostgreSQL"]);
        // Unmentioned sections default instead of failing.
        assert!(fields.topics.domains.is_empty());
    }

    #[test]
    fn decodes_json_wrapped_in_markdown_fences() {
        let raw = "```json\n{\"title\": \"Data Engineer\", \"required_skills\": [\"python\"]}\n```";
        let fields = decode_job_fields(raw).unwrap();
        assert_eq!(fields.title, "Data Engineer");
        assert_eq!(fields.required_skills, vec!["python"]);
    }

    #[test]
    fn malformed_payloads_fail_closed() {
        // Wrong type for a typed field rejects the whole document.
        assert!(decode_resume_fields(r#"{"experience": {"total_years": "six"}}"#).is_none());
        assert!(decode_job_fields(r#"{"required_skills": "python"}"#).is_none());
        assert!(decode_resume_fields("not json at all").is_none());
        assert!(decode_resume_fields("").is_none());
    }

    #[test]
    fn keyword_scan_finds_known_skills() {
        let text = "We need Python and AWS experience; Kubernetes is a plus.";
        let skills = scan_known_skills(text);
        assert!(skills.contains(&"python".to_string()));
        assert!(skills.contains(&"aws".to_string()));
        assert!(skills.contains(&"kubernetes".to_string()));
        assert!(!skills.contains(&"rust".to_string()));
    }

    #[test]
    fn experience_regex_takes_the_largest_mention() {
        assert_eq!(scan_experience_years("5+ years of Python, 3 years AWS"), Some(5.0));
        assert_eq!(scan_experience_years("2 yrs experience"), Some(2.0));
        assert_eq!(scan_experience_years("no numbers here"), None);
        // Implausible values are ignored.
        assert_eq!(scan_experience_years("99 years of COBOL"), None);
    }

    #[test]
    fn fallback_job_fields_carry_scanned_requirements() {
        let fields =
            fallback_job_fields("Senior role: 4+ years required. Stack: Rust, Docker, AWS.");
        assert!(fields.required_skills.contains(&"rust".to_string()));
        assert!(fields.required_skills.contains(&"docker".to_string()));
        assert_eq!(fields.required_experience_years, Some(4.0));
        assert!(fields.title.is_empty());
    }

    #[tokio::test]
    async fn pipeline_without_llm_uses_fallback_and_caches() {
        let pipeline = ExtractionPipeline::new(None);
        let text = "Backend engineer, 7 years, Rust and PostgreSQL.";

        let first = pipeline.extract_resume(text).await;
        assert_eq!(first.experience.total_years, 7.0);
        assert!(first.skills.technical.contains(&"rust".to_string()));

        let second = pipeline.extract_resume(text).await;
        assert_eq!(first, second);
    }
}
