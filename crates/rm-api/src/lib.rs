use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    extract::State,
    extract::connect_info::ConnectInfo,
    http::Method,
    http::Request,
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use rm_common::db::{PgStore, create_pool_from_url, run_migrations};
use rm_common::embedding::{TextEmbedder, create_embedder, load_config_from_env};
use rm_common::extraction::ExtractionPipeline;
use rm_common::index::{QdrantConfig, QdrantIndex, VectorIndex};
use rm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use rm_common::matching::{MatchWeights, RankerConfig};
use rm_common::store::RecordStore;

pub mod auth;
pub mod error;
pub mod handlers;

use auth::AuthConfig;
use error::ApiError;
use handlers::{health, jobs, matches, resumes};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "rm-api", about = "HTTP API for resume-to-job matching")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// API key for X-API-Key authentication
    #[arg(long, env = "RM_API_KEY")]
    api_key: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "RM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Embedding backend: http | hash
    #[arg(long, env = "RM_EMBEDDER", default_value = "http")]
    embedder: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    fn from_cli(cli: &Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "RM_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        let api_key = cli
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::BadRequest("RM_API_KEY is required".into()))?;

        Ok(Self {
            port: cli.port,
            cors_origins,
            auth: AuthConfig { api_key },
        })
    }

    pub fn for_tests(api_key: &str) -> Self {
        Self {
            port: 8080,
            cors_origins: vec!["http://localhost:3000".into()],
            auth: AuthConfig {
                api_key: api_key.into(),
            },
        }
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u64,
    pub burst: u32,
}

impl RateLimitConfig {
    fn from_env() -> Self {
        Self {
            per_sec: env::var("RM_RATE_LIMIT_GLOBAL_PER_SEC")
                .ok()
                .and_then(|value| value.parse().ok())
                .filter(|value| *value > 0)
                .unwrap_or(20),
            burst: env::var("RM_RATE_LIMIT_GLOBAL_BURST")
                .ok()
                .and_then(|value| value.parse().ok())
                .filter(|value| *value > 0)
                .unwrap_or(40),
        }
    }
}

fn build_ip_limiter(per_second: u64, burst_size: u32) -> Arc<IpRateLimiter> {
    let nanos_per_token = 1_000_000_000u64 / per_second.max(1);
    let quota = Quota::with_period(Duration::from_nanos(nanos_per_token.max(1)))
        .unwrap()
        .allow_burst(NonZeroU32::new(burst_size.max(1)).unwrap());

    Arc::new(RateLimiter::keyed(quota))
}

pub fn default_rate_limits() -> RateLimits {
    let cfg = RateLimitConfig::from_env();
    RateLimits {
        global: build_ip_limiter(cfg.per_sec, cfg.burst),
    }
}

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub index: Arc<dyn VectorIndex>,
    pub embedder: Arc<dyn TextEmbedder>,
    pub extraction: Arc<ExtractionPipeline>,
    pub weights: MatchWeights,
    pub ranker_config: RankerConfig,
    pub config: AppConfig,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ])
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

async fn global_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(client_ip) = request_ip(&req) {
        if state.rate_limits.global.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let api_routes = Router::new()
        .route("/resumes", post(resumes::upload_resume))
        .route("/resumes/:id", get(resumes::get_resume))
        .route("/jobs", post(jobs::upload_job))
        .route("/jobs/:id", get(jobs::get_job))
        .route("/jobs/:id/candidates", get(matches::rank_candidates))
        .route("/score", post(matches::score_pair));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

/// State wired to in-memory backends; used by the router smoke tests.
pub fn test_state(api_key: &str) -> SharedState {
    use rm_common::embedding::{EmbedderConfig, HashEmbedder};
    use rm_common::index::MemoryIndex;
    use rm_common::store::MemoryStore;

    const TEST_DIMENSION: usize = 64;

    let embedder_config = EmbedderConfig {
        dimension: TEST_DIMENSION,
        ..EmbedderConfig::default()
    };

    Arc::new(AppState {
        store: Arc::new(MemoryStore::new()),
        index: Arc::new(MemoryIndex::new(TEST_DIMENSION)),
        embedder: Arc::new(HashEmbedder::new(embedder_config)),
        extraction: Arc::new(ExtractionPipeline::new(None)),
        weights: MatchWeights::default(),
        ranker_config: RankerConfig::default(),
        config: AppConfig::for_tests(api_key),
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber("rm-api");
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;

    let pool = create_pool_from_url(&cli.database_url)
        .map_err(|err| ApiError::Storage(format!("failed to create pool: {err}")))?;
    run_migrations(&pool)
        .await
        .map_err(|err| ApiError::Storage(format!("failed to run migrations: {err}")))?;
    let store: Arc<dyn RecordStore> = Arc::new(PgStore::new(pool));

    let embedder_config = load_config_from_env();
    let embedder = create_embedder(&cli.embedder, embedder_config.clone());

    let index: Arc<dyn VectorIndex> = Arc::new(
        QdrantIndex::connect(QdrantConfig::from_env("resumes", embedder_config.dimension))
            .await
            .map_err(|err| ApiError::ServiceUnavailable(format!("vector index: {err}")))?,
    );

    let state = Arc::new(AppState {
        store,
        index,
        embedder,
        extraction: Arc::new(ExtractionPipeline::from_env()),
        weights: MatchWeights::from_env(),
        ranker_config: RankerConfig::from_env(),
        config: config.clone(),
        rate_limits: default_rate_limits(),
        readiness: Arc::new(AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, embedder = %state.embedder.name(), "rm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Give load balancers a window to observe /readyz as not ready before
    // axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Mutex;
    use tower::ServiceExt;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn with_envs(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let _guard = ENV_GUARD.lock().unwrap();

        let previous: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(var, value)| {
                let old = env::var(var).ok();
                match value {
                    Some(v) => unsafe { env::set_var(var, v) },
                    None => unsafe { env::remove_var(var) },
                }
                (*var, old)
            })
            .collect();

        f();

        for (var, previous_value) in previous {
            match previous_value {
                Some(v) => unsafe { env::set_var(var, v) },
                None => unsafe { env::remove_var(var) },
            }
        }
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static("x-request-id"),
                MakeRequestUuid::default(),
            ));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn rate_limit_config_respects_env_overrides() {
        with_envs(
            &[
                ("RM_RATE_LIMIT_GLOBAL_PER_SEC", Some("10")),
                ("RM_RATE_LIMIT_GLOBAL_BURST", Some("25")),
            ],
            || {
                let cfg = RateLimitConfig::from_env();
                assert_eq!(
                    cfg,
                    RateLimitConfig {
                        per_sec: 10,
                        burst: 25,
                    }
                );
            },
        );
    }
}
