//! # grievance-api
//!
//! HTTP service for grievance intake, status tracking and the external
//! case-management sync channel. The binary in `main.rs` reads
//! [`AppConfig`], builds [`AppState`] and serves [`build_router`].

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod services;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use governor::{Quota, RateLimiter};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use grievance_core::{
    CategorizationAdvisor, GrievanceIdGenerator, GrievanceRepository, HouseholdDirectory,
    Notifier, ObjectStore, Result, Taxonomy,
};
use grievance_db::{
    Database, FilesystemObjectStore, GrievanceStore, HttpObjectStore, InMemoryGrievanceRepository,
    PoolConfig, StaticHouseholdDirectory,
};
use grievance_inference::{LlmCategorizer, OpenAIBackend, OpenAIConfig};

pub use config::AppConfig;
pub use error::ApiError;

use config::{ObjectStoreConfig, StorageBackend};
use handlers::{attachments, batch, categorization, grievances, health, sync};
use middleware::{rate_limit_middleware, require_sync_auth, GlobalRateLimiter, SyncGatekeeper};
use services::{HttpMailNotifier, LogNotifier};

/// Extra room on top of the upload cap for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: GrievanceStore,
    pub ids: GrievanceIdGenerator,
    pub taxonomy: Arc<Taxonomy>,
    /// Categorization advisor (None when no API key is configured).
    pub advisor: Option<Arc<dyn CategorizationAdvisor>>,
    pub notifier: Arc<dyn Notifier>,
    /// Attachment hosting (None disables uploads).
    pub object_store: Option<Arc<dyn ObjectStore>>,
    pub gatekeeper: Arc<SyncGatekeeper>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    /// State with the given storage and no optional upstreams; confirmations
    /// are logged. Use the `with_*` methods to attach collaborators.
    pub fn new(
        config: AppConfig,
        repo: Arc<dyn GrievanceRepository>,
        households: Arc<dyn HouseholdDirectory>,
    ) -> Self {
        let gatekeeper = SyncGatekeeper::new(
            config.sync_token.as_deref(),
            config.sync_allowed_ips.clone(),
        );
        let rate_limiter = config.rate_limit.and_then(|rl| {
            let burst = NonZeroU32::new(u32::try_from(rl.requests).unwrap_or(u32::MAX))?;
            let quota = Quota::with_period(Duration::from_secs(rl.period_secs))?.allow_burst(burst);
            Some(Arc::new(RateLimiter::direct(quota)))
        });

        Self {
            ids: GrievanceIdGenerator::new(config.id_prefix.clone()),
            store: GrievanceStore::new(repo, households),
            taxonomy: Arc::new(Taxonomy::default()),
            advisor: None,
            notifier: Arc::new(LogNotifier),
            object_store: None,
            gatekeeper: Arc::new(gatekeeper),
            rate_limiter,
            config: Arc::new(config),
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: Arc<Taxonomy>) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn CategorizationAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Wire every collaborator named in `config`.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let repo: Arc<dyn GrievanceRepository> = match config.storage {
            StorageBackend::Memory => {
                warn!("STORAGE_BACKEND=memory: records are lost on restart");
                Arc::new(InMemoryGrievanceRepository::new())
            }
            StorageBackend::Postgres => {
                let url = config.database_url.as_deref().unwrap_or_default();
                let pool_config = PoolConfig::new().max_connections(config.db_max_connections);
                let db = Database::connect_with_config(url, pool_config).await?;
                db.migrate().await?;
                info!("Database connected and migrated");
                Arc::new(db.grievances)
            }
        };

        let households: Arc<dyn HouseholdDirectory> = match &config.household_directory_path {
            Some(path) => Arc::new(StaticHouseholdDirectory::from_file(path)?),
            None => Arc::new(StaticHouseholdDirectory::default()),
        };

        let taxonomy = Arc::new(match &config.taxonomy_path {
            Some(path) => Taxonomy::from_file(path)?,
            None => Taxonomy::default(),
        });

        let advisor: Option<Arc<dyn CategorizationAdvisor>> = match &config.advisor {
            Some(advisor) => {
                let backend = OpenAIBackend::new(OpenAIConfig {
                    base_url: advisor.base_url.clone(),
                    api_key: Some(advisor.api_key.clone()),
                    gen_model: advisor.model.clone(),
                    timeout_seconds: advisor.timeout_secs,
                    ..Default::default()
                })?;
                info!(model = %advisor.model, "Categorization advisor enabled");
                Some(Arc::new(LlmCategorizer::new(Arc::new(backend), taxonomy.clone())))
            }
            None => {
                info!("OPENAI_API_KEY not set, auto-categorization disabled");
                None
            }
        };

        let notifier: Arc<dyn Notifier> = match &config.notify.endpoint {
            Some(endpoint) => Arc::new(HttpMailNotifier::new(
                endpoint.clone(),
                config.notify.from.clone(),
                config.notify.api_key.clone(),
            )?),
            None => Arc::new(LogNotifier),
        };

        let object_store: Option<Arc<dyn ObjectStore>> = match &config.object_store {
            ObjectStoreConfig::Http {
                endpoint,
                bucket,
                public_url,
            } => Some(Arc::new(HttpObjectStore::new(
                endpoint.clone(),
                bucket.clone(),
                public_url.clone(),
            )?)),
            ObjectStoreConfig::Filesystem { path, public_url } => Some(Arc::new(
                FilesystemObjectStore::new(path.clone(), public_url.clone()),
            )),
            ObjectStoreConfig::Disabled => None,
        };

        if config.sync_token.is_none() {
            warn!("SYNC_TOKEN not set, /sync endpoints will answer 503");
        }

        let mut state = Self::new(config, repo, households)
            .with_taxonomy(taxonomy)
            .with_notifier(notifier);
        state.advisor = advisor;
        state.object_store = object_store;
        Ok(state)
    }
}

// =============================================================================
// ROUTER
// =============================================================================

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static("x-grievance-id")])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.upload_max_bytes as usize + MULTIPART_OVERHEAD_BYTES;

    let sync_routes = Router::new()
        .route("/sync/:id/status", put(sync::push_status))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_sync_auth,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/grievances", post(grievances::create_grievance))
        .route("/grievances/export", get(grievances::export_grievances))
        .route("/grievances/categorize", post(categorization::categorize))
        .route("/grievances/status-batch", put(batch::update_status_batch))
        .route("/grievances/:id", get(grievances::get_grievance))
        .route("/grievances/:id/status", put(grievances::update_status))
        .route("/grievances/:id/receipt.pdf", get(grievances::receipt_pdf))
        .route(
            "/attachments",
            post(attachments::upload_attachment).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .merge(sync_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use config::RateLimitConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_from_config_memory_wiring() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::for_memory();
        config.object_store = ObjectStoreConfig::Filesystem {
            path: dir.path().to_path_buf(),
            public_url: "/files".to_string(),
        };
        config.sync_token = Some("secret".to_string());

        let state = AppState::from_config(config).await.unwrap();
        assert!(state.object_store.is_some());
        assert!(state.advisor.is_none());
        assert!(state.rate_limiter.is_none());
        assert!(state.gatekeeper.is_configured());
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429() {
        let mut config = AppConfig::for_memory();
        config.rate_limit = Some(RateLimitConfig {
            requests: 2,
            period_secs: 60,
        });
        let state = AppState::new(
            config,
            Arc::new(InMemoryGrievanceRepository::new()),
            Arc::new(StaticHouseholdDirectory::default()),
        );
        let app = build_router(state);

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            statuses.push(response.status());
        }
        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let state = AppState::new(
            AppConfig::for_memory(),
            Arc::new(InMemoryGrievanceRepository::new()),
            Arc::new(StaticHouseholdDirectory::default()),
        );
        let response = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
