use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;
use tracing::{info, warn};

use rm_common::DocumentKind;
use rm_common::db::{PgStore, create_pool_from_url, run_migrations};
use rm_common::embedding::{EmbeddingSource, TextEmbedder, create_embedder, load_config_from_env};
use rm_common::extraction::ExtractionPipeline;
use rm_common::index::{IndexPoint, PointPayload, QdrantConfig, QdrantIndex, VectorIndex, preview_of};
use rm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use rm_common::store::RecordStore;

#[derive(Debug, Parser)]
#[command(
    name = "rm-indexer",
    about = "Bulk-load resumes and job descriptions into the match index"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Directory of plain-text resume files (*.txt)
    #[arg(long)]
    resumes_dir: Option<PathBuf>,

    /// JSON file with an array of job descriptions
    #[arg(long)]
    jobs_file: Option<PathBuf>,

    /// Embedding backend: http | hash
    #[arg(long, env = "RM_EMBEDDER", default_value = "http")]
    embedder: String,
}

/// One job entry in the bulk file. `text` and `description` are accepted
/// interchangeably; explicit fields override extraction.
#[derive(Debug, Clone, Deserialize)]
struct JobSeed {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    experience_years: Option<f64>,
}

impl JobSeed {
    fn body(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or(self.description.as_deref())
            .map(str::trim)
            .filter(|body| !body.is_empty())
    }
}

fn parse_job_seeds(raw: &str) -> Result<Vec<JobSeed>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[derive(Debug, Default)]
struct Counters {
    processed: usize,
    failed: usize,
}

struct Loader {
    extraction: ExtractionPipeline,
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn RecordStore>,
    index: Arc<dyn VectorIndex>,
}

impl Loader {
    async fn load_resume(&self, text: &str, source: &str) -> Result<String, String> {
        let fields = self.extraction.extract_resume(text).await;

        let embedding = self
            .embedder
            .embed(text, EmbeddingSource::Resume)
            .await
            .map_err(|e| format!("embed: {e}"))?;

        let record = fields.into_record(text);
        self.store
            .insert_resume(&record)
            .await
            .map_err(|e| format!("store: {e}"))?;

        self.index
            .upsert(vec![IndexPoint {
                id: record.id.clone(),
                vector: embedding.vector,
                payload: PointPayload {
                    kind: DocumentKind::Resume,
                    title: record.profile.title.clone().unwrap_or_default(),
                    skills: record.skills.technical.clone(),
                    preview: preview_of(text),
                },
            }])
            .await
            .map_err(|e| format!("index: {e}"))?;

        info!(resume_id = %record.id, source, "resume loaded");
        Ok(record.id)
    }

    async fn load_job(&self, seed: &JobSeed) -> Result<String, String> {
        let body = seed.body().ok_or("job entry has no text")?;

        let fields = self.extraction.extract_job(body).await;
        let mut record = fields.into_record(body);

        if let Some(title) = seed.title.clone().filter(|t| !t.trim().is_empty()) {
            record.title = title;
        }
        if seed.company.is_some() {
            record.company = seed.company.clone();
        }
        if seed.experience_years.is_some() {
            record.required_experience_years = seed.experience_years;
        }

        self.store
            .insert_job(&record)
            .await
            .map_err(|e| format!("store: {e}"))?;

        info!(job_id = %record.id, title = %record.title, "job loaded");
        Ok(record.id)
    }

    async fn load_resumes_dir(&self, dir: &Path) -> Result<Counters, std::io::Error> {
        let mut counters = Counters::default();

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        entries.sort();

        for path in entries {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to read resume file");
                    counters.failed += 1;
                    continue;
                }
            };

            if text.trim().is_empty() {
                warn!(path = %path.display(), "empty resume file; skipping");
                counters.failed += 1;
                continue;
            }

            match self
                .load_resume(text.trim(), &path.display().to_string())
                .await
            {
                Ok(_) => counters.processed += 1,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to load resume");
                    counters.failed += 1;
                }
            }
        }

        Ok(counters)
    }

    async fn load_jobs_file(&self, path: &Path) -> Result<Counters, std::io::Error> {
        let mut counters = Counters::default();

        let raw = std::fs::read_to_string(path)?;
        let seeds = match parse_job_seeds(&raw) {
            Ok(seeds) => seeds,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "jobs file is not a JSON array");
                counters.failed += 1;
                return Ok(counters);
            }
        };

        for (idx, seed) in seeds.iter().enumerate() {
            match self.load_job(seed).await {
                Ok(_) => counters.processed += 1,
                Err(err) => {
                    warn!(path = %path.display(), idx, error = %err, "failed to load job");
                    counters.failed += 1;
                }
            }
        }

        Ok(counters)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing_subscriber("rm-indexer");
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let args = Cli::parse();
    if args.resumes_dir.is_none() && args.jobs_file.is_none() {
        return Err("nothing to do: pass --resumes-dir and/or --jobs-file".into());
    }

    let pool = create_pool_from_url(&args.db_url)?;
    run_migrations(&pool).await?;

    let embedder_config = load_config_from_env();
    let embedder = create_embedder(&args.embedder, embedder_config.clone());
    let index: Arc<dyn VectorIndex> = Arc::new(
        QdrantIndex::connect(QdrantConfig::from_env("resumes", embedder_config.dimension)).await?,
    );

    let loader = Loader {
        extraction: ExtractionPipeline::from_env(),
        embedder,
        store: Arc::new(PgStore::new(pool)),
        index,
    };

    if let Some(dir) = &args.resumes_dir {
        let counters = loader.load_resumes_dir(dir).await?;
        info!(
            processed = counters.processed,
            failed = counters.failed,
            dir = %dir.display(),
            "resume bulk load finished"
        );
    }

    if let Some(path) = &args.jobs_file {
        let counters = loader.load_jobs_file(path).await?;
        info!(
            processed = counters.processed,
            failed = counters.failed,
            file = %path.display(),
            "job bulk load finished"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("rm-indexer failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_seed_accepts_text_or_description() {
        let seeds = parse_job_seeds(
            r#"[
                {"text": "Rust engineer wanted"},
                {"description": "Python engineer wanted", "title": "Data Eng"},
                {"title": "No body"}
            ]"#,
        )
        .unwrap();

        assert_eq!(seeds[0].body(), Some("Rust engineer wanted"));
        assert_eq!(seeds[1].body(), Some("Python engineer wanted"));
        assert_eq!(seeds[1].title.as_deref(), Some("Data Eng"));
        assert_eq!(seeds[2].body(), None);
    }

    #[test]
    fn blank_bodies_are_rejected() {
        let seeds = parse_job_seeds(r#"[{"text": "   "}]"#).unwrap();
        assert_eq!(seeds[0].body(), None);
    }

    #[test]
    fn non_array_files_fail_parse() {
        assert!(parse_job_seeds(r#"{"text": "single object"}"#).is_err());
    }

    #[tokio::test]
    async fn loader_round_trips_with_memory_backends() {
        use rm_common::embedding::{EmbedderConfig, HashEmbedder};
        use rm_common::index::MemoryIndex;
        use rm_common::store::MemoryStore;

        let loader = Loader {
            extraction: ExtractionPipeline::new(None),
            embedder: Arc::new(HashEmbedder::new(EmbedderConfig {
                dimension: 32,
                ..EmbedderConfig::default()
            })),
            store: Arc::new(MemoryStore::new()),
            index: Arc::new(MemoryIndex::new(32)),
        };

        let id = loader
            .load_resume("5 years of Rust and AWS.", "inline")
            .await
            .unwrap();
        assert!(loader.store.fetch_resume(&id).await.unwrap().is_some());
        assert_eq!(loader.index.count().await.unwrap(), 1);

        let seed = JobSeed {
            text: Some("Requires 2 years of Rust".into()),
            description: None,
            title: Some("Rust Engineer".into()),
            company: None,
            experience_years: None,
        };
        let job_id = loader.load_job(&seed).await.unwrap();
        let stored = loader.store.fetch_job(&job_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Rust Engineer");
        assert_eq!(stored.required_experience_years, Some(2.0));
    }
}
