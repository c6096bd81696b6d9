use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adsignal_core::detect::{build_google_chain, build_meta_chain};
use adsignal_core::fetcher::{HttpFetcher, NoopSearcher, SerperSearcher};
use adsignal_core::traits::{PageDirectory, PageFetcher, WebSearcher};
use adsignal_core::{
    AdsPipeline, CheckRequest, CheckResult, CheckStatus, Config, IdentityResolver, MemoryCache,
};
use metagraph_client::GraphClient;

pub struct AppState {
    pub pipeline: AdsPipeline,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    domain: Option<String>,
    facebook_page: Option<String>,
    meta_page_id: Option<String>,
    has_meta_ads: bool,
    has_google_ads: bool,
    success: bool,
    message: String,
}

impl From<CheckResult> for CheckResponse {
    fn from(result: CheckResult) -> Self {
        let success = result.is_success();
        Self {
            domain: result.identity.domain,
            facebook_page: result.identity.social_page,
            meta_page_id: result.identity.page_id,
            has_meta_ads: result.has_meta_ads,
            has_google_ads: result.has_google_ads,
            success,
            message: result.message,
        }
    }
}

async fn check_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckRequest>,
) -> (StatusCode, Json<CheckResponse>) {
    let result = state.pipeline.check(&request).await;

    let status = match result.status {
        CheckStatus::Success => StatusCode::OK,
        CheckStatus::Invalid => StatusCode::BAD_REQUEST,
        CheckStatus::PartialFailure => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(result.into()))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "AdSignal API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "adsignal-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("adsignal_core=info".parse()?)
                .add_directive("adsignal_api=info".parse()?)
                .add_directive("metagraph_client=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    // One client per collaborator, shared for the process lifetime.
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(config.http_timeout));
    let searcher: Arc<dyn WebSearcher> = match config.serper_api_key.as_deref() {
        Some(key) => Arc::new(SerperSearcher::new(key, config.http_timeout)),
        None => {
            info!("SERPER_API_KEY not set, web-search resolution disabled");
            Arc::new(NoopSearcher)
        }
    };
    let directory: Arc<dyn PageDirectory> =
        Arc::new(GraphClient::new(config.meta_access_token.as_deref()));

    let resolver = IdentityResolver::new(fetcher.clone(), searcher, directory.clone());
    let meta_chain = build_meta_chain(&config.meta_probe_order, &fetcher, &directory);
    let google_chain = build_google_chain(&config.google_probe_order, &fetcher);

    let pipeline = AdsPipeline::new(
        resolver,
        meta_chain,
        google_chain,
        Arc::new(MemoryCache::new()),
        config.cache_ttl,
    );
    let state = Arc::new(AppState { pipeline });

    let app = Router::new()
        // Health
        .route("/", get(root))
        .route("/health", get(health))
        // Check API
        .route("/v1/check", post(check_handler))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path + status + latency
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("AdSignal API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
