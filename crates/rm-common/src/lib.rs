pub mod api;
pub mod db;
pub mod embedding;
pub mod extraction;
pub mod index;
pub mod logging;
pub mod matching;
pub mod run_id;
pub mod skill_normalizer;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of document a piece of raw text is. Drives prompt selection,
/// embedding source tagging and index payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    Job,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::Job => "job",
        }
    }
}

// Commonly used data models shared by the extraction, matching and storage layers.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Profile {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Experience {
    pub total_years: f64,
    pub roles: Vec<String>,
    pub companies: Vec<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Topics {
    pub domains: Vec<String>,
    pub specializations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Tools {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub platforms: Vec<String>,
}

/// A processed resume. Immutable once created; re-processing the same source
/// text replaces the whole record under a fresh id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: String,
    pub profile: Profile,
    pub experience: Experience,
    pub skills: Skills,
    pub topics: Topics,
    pub tools: Tools,
    pub summary: String,
    pub source_text: String,
    pub created_at: DateTime<Utc>,
}

impl Default for ResumeRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            profile: Profile::default(),
            experience: Experience::default(),
            skills: Skills::default(),
            topics: Topics::default(),
            tools: Tools::default(),
            summary: String::new(),
            source_text: String::new(),
            created_at: Utc::now(),
        }
    }
}

impl ResumeRecord {
    /// Display name for result listings; falls back to the record id.
    pub fn display_name(&self) -> &str {
        match self.profile.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }
}

/// A processed job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    /// None means the posting states no experience requirement.
    pub required_experience_years: Option<f64>,
    pub responsibilities: Vec<String>,
    pub summary: String,
    pub source_text: String,
    pub created_at: DateTime<Utc>,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            company: None,
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            required_experience_years: None,
            responsibilities: Vec::new(),
            summary: String::new(),
            source_text: String::new(),
            created_at: Utc::now(),
        }
    }
}
