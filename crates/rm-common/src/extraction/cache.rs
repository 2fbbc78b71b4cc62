use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::{JobFields, ResumeFields};

/// SHA-256 of the raw document text, truncated to 16 hex chars. Used as the
/// extraction cache key and stable across reprocessing of identical uploads.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let bytes = hasher.finalize();
    let mut hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(16);
    hex
}

/// Extraction results keyed by content hash. Strictly an optimization:
/// correctness never depends on a hit, and entries live only for the
/// process lifetime.
#[derive(Default)]
pub struct ExtractionCache {
    resumes: RwLock<HashMap<String, ResumeFields>>,
    jobs: RwLock<HashMap<String, JobFields>>,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_resume(&self, hash: &str) -> Option<ResumeFields> {
        self.resumes.read().await.get(hash).cloned()
    }

    pub async fn put_resume(&self, hash: String, fields: ResumeFields) {
        self.resumes.write().await.insert(hash, fields);
    }

    pub async fn get_job(&self, hash: &str) -> Option<JobFields> {
        self.jobs.read().await.get(hash).cloned()
    }

    pub async fn put_job(&self, hash: String, fields: JobFields) {
        self.jobs.write().await.insert(hash, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_short() {
        let a = content_hash("senior rust engineer");
        let b = content_hash("senior rust engineer");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_text_hashes_differently() {
        assert_ne!(content_hash("alpha"), content_hash("beta"));
    }

    #[tokio::test]
    async fn caches_by_hash() {
        let cache = ExtractionCache::new();
        let hash = content_hash("text");
        assert!(cache.get_resume(&hash).await.is_none());

        cache
            .put_resume(hash.clone(), ResumeFields::default())
            .await;
        assert!(cache.get_resume(&hash).await.is_some());
        assert!(cache.get_job(&hash).await.is_none());
    }
}
