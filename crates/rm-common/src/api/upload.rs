use serde::Deserialize;

/// Raw resume text for processing. Parsing of PDF/DOCX happens upstream;
/// this API accepts plain text only.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResumeRequest {
    pub text: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Raw job description text plus optional overrides. Explicit values win
/// over whatever extraction finds.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadJobRequest {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub required_experience_years: Option<f64>,
}
