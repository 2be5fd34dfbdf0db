//! fitquest-api - HTTP API server for fitquest

mod handlers;

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fitquest_core::defaults::{
    ACCESS_TOKEN_TTL_MINUTES, MAX_BODY_BYTES, REFRESH_TOKEN_TTL_DAYS, SERVER_PORT,
};
use fitquest_core::{Geocoder, User};
use fitquest_db::{Database, PoolConfig};

use handlers::{accounts, geocode, missions, places};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Server settings read from the environment.
#[derive(Debug, Clone)]
struct ApiConfig {
    database_url: String,
    host: String,
    port: u16,
    tokens: TokenSettings,
    max_body_bytes: usize,
    rate_limit_enabled: bool,
    rate_limit_requests: u32,
    rate_limit_period_secs: u64,
}

impl ApiConfig {
    fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/fitquest".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", SERVER_PORT),
            tokens: TokenSettings::from_env(),
            max_body_bytes: env_or("MAX_BODY_BYTES", MAX_BODY_BYTES),
            rate_limit_enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", 100),
            rate_limit_period_secs: env_or("RATE_LIMIT_PERIOD_SECS", 60),
        }
    }

    fn rate_limiter(&self) -> Option<Arc<GlobalRateLimiter>> {
        if !self.rate_limit_enabled {
            return None;
        }
        let burst = NonZeroU32::new(self.rate_limit_requests);
        let quota = Quota::with_period(std::time::Duration::from_secs(self.rate_limit_period_secs));
        match (quota, burst) {
            (Some(quota), Some(burst)) => {
                Some(Arc::new(RateLimiter::direct(quota.allow_burst(burst))))
            }
            _ => {
                warn!(
                    requests = self.rate_limit_requests,
                    period_secs = self.rate_limit_period_secs,
                    "Rate limit settings must be non-zero; rate limiting disabled"
                );
                None
            }
        }
    }
}

/// Bearer token lifetimes.
#[derive(Debug, Clone, Copy)]
struct TokenSettings {
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenSettings {
    fn from_env() -> Self {
        Self {
            access_ttl: chrono::Duration::minutes(env_or(
                "ACCESS_TOKEN_TTL_MINUTES",
                ACCESS_TOKEN_TTL_MINUTES,
            )),
            refresh_ttl: chrono::Duration::days(env_or(
                "REFRESH_TOKEN_TTL_DAYS",
                REFRESH_TOKEN_TTL_DAYS,
            )),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl: chrono::Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: chrono::Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }
}

/// Parse allowed origins from the comma-separated `CORS_ALLOWED_ORIGINS`.
///
/// Defaults to the local web and Expo dev servers.
fn parse_allowed_origins(raw: Option<&str>) -> Vec<HeaderValue> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("http://localhost:3000,http://localhost:8081");

    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// STATE
// =============================================================================

/// Global rate limiter type (direct quota, no keyed bucketing).
type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Database,
    /// Backs the explicit geocode endpoint.
    geocoder: Arc<dyn Geocoder>,
    tokens: TokenSettings,
    /// Global rate limiter (None if rate limiting is disabled).
    rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

// =============================================================================
// LOGGING
// =============================================================================

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "fitquest_api=debug,tower_http=debug")
///
/// The returned guard must be held for the lifetime of the process when
/// logging to a file.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fitquest_api=debug,fitquest_db=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("fitquest-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(log_ansi.unwrap_or(false)),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

// =============================================================================
// ROUTER
// =============================================================================

fn build_router(
    state: AppState,
    allowed_origins: Vec<HeaderValue>,
    max_body_bytes: usize,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Accounts
        .route("/api/v1/accounts/register", post(accounts::register))
        .route("/api/v1/accounts/login", post(accounts::login))
        .route("/api/v1/accounts/token/refresh", post(accounts::refresh_token))
        .route("/api/v1/accounts/me", get(accounts::me))
        .route("/api/v1/accounts/logout", post(accounts::logout))
        .route(
            "/api/v1/accounts/profile",
            get(accounts::get_profile).patch(accounts::update_profile),
        )
        .route("/api/v1/accounts/points", get(accounts::point_history))
        // Missions
        .route("/api/v1/missions/generate", post(missions::generate))
        .route("/api/v1/missions/available", get(missions::list_available))
        .route("/api/v1/missions/ongoing", get(missions::list_ongoing))
        .route("/api/v1/missions/completed", get(missions::list_completed))
        .route("/api/v1/missions/stats", get(missions::stats))
        .route("/api/v1/missions/:mission_id/start", post(missions::start))
        .route("/api/v1/missions/:mission_id/complete", post(missions::complete))
        .route("/api/v1/missions/:mission_id/cancel", post(missions::cancel))
        // Nearby lookups
        .route("/api/v1/places/nearby", get(places::nearby_places))
        .route("/api/v1/equipment/nearby", get(places::nearby_equipment))
        // Geocoding
        .route("/api/v1/geocode", post(geocode::geocode_address))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(CatchPanicLayer::new())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let config = ApiConfig::from_env();
    info!(
        rate_limit_enabled = config.rate_limit_enabled,
        requests = config.rate_limit_requests,
        period_secs = config.rate_limit_period_secs,
        access_ttl_minutes = config.tokens.access_ttl.num_minutes(),
        "Configuration loaded"
    );

    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env()).await?;
    db.migrate().await?;
    info!("Database connected and migrated");

    let geocoder = fitquest_geocode::geocoder_from_env()?;
    info!(provider = geocoder.provider(), "Geocoder ready");

    let state = AppState {
        db,
        geocoder,
        tokens: config.tokens,
        rate_limiter: config.rate_limiter(),
    };

    let origins = parse_allowed_origins(std::env::var("CORS_ALLOWED_ORIGINS").ok().as_deref());
    let app = build_router(state, origins, config.max_body_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            warn!(subsystem = "api", "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor that requires a live access token.
#[derive(Debug, Clone)]
struct RequireAuth {
    user: User,
    /// The presented access token, kept so logout can revoke it.
    token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let user = state
            .db
            .users
            .validate_access_token(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Token is invalid or expired".to_string()))?;

        Ok(RequireAuth {
            user,
            token: token.to_string(),
        })
    }
}

/// JSON body extractor whose rejections use the `{"error": ...}` shape.
#[derive(Debug)]
struct ApiJson<T>(T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::from(rejection)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(
            subsystem = "api",
            status = rejection.status().as_u16(),
            error = %rejection.body_text(),
            "Rejected request body"
        );
        ApiError::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Internal(fitquest_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Completion attempted farther than the proximity radius.
    TooFar { distance_km: f64 },
}

impl From<fitquest_core::Error> for ApiError {
    fn from(err: fitquest_core::Error) -> Self {
        use fitquest_core::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::InvalidTransition(e) => ApiError::BadRequest(e.to_string()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ApiError::Conflict(db_err.message().to_string())
            }
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": err.to_string() }),
                )
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, serde_json::json!({ "error": msg }))
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::TooFar { distance_km } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": format!(
                        "목표 장소에서 {:.2}km 떨어져 있습니다. 더 가까이 가주세요.",
                        distance_km
                    ),
                    "distance": distance_km,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitquest_core::{Error, MissionAction, MissionStatus, TransitionError};
    use fitquest_geocode::{DisabledGeocoder, KakaoConfig, KakaoGeocoder};
    use sqlx::postgres::PgPoolOptions;
    use wiremock::matchers::{header as header_matcher, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// State over a lazily connected pool: routes that never reach the
    /// database work without one.
    fn test_state(geocoder: Arc<dyn Geocoder>) -> AppState {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| fitquest_db::test_fixtures::DEFAULT_TEST_DATABASE_URL.to_string());
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&url)
            .unwrap();
        AppState {
            db: Database::new(pool),
            geocoder,
            tokens: TokenSettings::default(),
            rate_limiter: None,
        }
    }

    async fn spawn_test_server(state: AppState) -> String {
        let router = build_router(state, parse_allowed_origins(None), MAX_BODY_BYTES);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn kakao_server(body: serde_json::Value, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/local/search/address.json"))
            .and(header_matcher("Authorization", "KakaoAK test-key"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn kakao_geocoder(server: &MockServer) -> Arc<dyn Geocoder> {
        let mut config = KakaoConfig::new("test-key");
        config.base_url = server.uri();
        Arc::new(KakaoGeocoder::new(config).unwrap())
    }

    // -- Error mapping --

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (Error::Conflict("x".into()), StatusCode::CONFLICT),
            (Error::Geocoding("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_invalid_transition_is_bad_request() {
        let err = Error::InvalidTransition(TransitionError {
            action: MissionAction::Complete,
            from: MissionStatus::Available,
        });
        assert_eq!(
            ApiError::from(err).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer fq_at_abc"));
        assert_eq!(bearer_token(&headers), Some("fq_at_abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_parse_allowed_origins() {
        let origins = parse_allowed_origins(Some("https://a.example, ,https://b.example"));
        assert_eq!(origins.len(), 2);
        assert_eq!(parse_allowed_origins(Some("   ")).len(), 2);
    }

    // -- HTTP --

    #[tokio::test]
    async fn test_health_has_version_and_request_id() {
        let base = spawn_test_server(test_state(Arc::new(DisabledGeocoder))).await;
        let response = reqwest::get(format!("{}/health", base)).await.unwrap();

        assert_eq!(response.status(), 200);
        assert!(response.headers().contains_key("x-request-id"));
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_mission_routes_require_token() {
        let base = spawn_test_server(test_state(Arc::new(DisabledGeocoder))).await;
        let client = reqwest::Client::new();

        for route in ["available", "ongoing", "completed", "stats"] {
            let response = client
                .get(format!("{}/api/v1/missions/{}", base, route))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 401, "route {}", route);
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "Authentication required");
        }
    }

    #[tokio::test]
    async fn test_nearby_places_requires_location() {
        let base = spawn_test_server(test_state(Arc::new(DisabledGeocoder))).await;

        let queries = [
            "",
            "?lat=36.8",
            "?lat=0&lon=127.1",
            "?lat=abc&lon=127.1",
            "?lat=36.8&lon=127.1&limit=x",
        ];
        for query in queries {
            let response = reqwest::get(format!("{}/api/v1/places/nearby{}", base, query))
                .await
                .unwrap();
            assert_eq!(response.status(), 400, "query {:?}", query);
        }
    }

    #[tokio::test]
    async fn test_geocode_requires_address() {
        let base = spawn_test_server(test_state(Arc::new(DisabledGeocoder))).await;
        let client = reqwest::Client::new();

        for body in [serde_json::json!({}), serde_json::json!({"address": "  "})] {
            let response = client
                .post(format!("{}/api/v1/geocode", base))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 400);
        }
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        let base = spawn_test_server(test_state(Arc::new(DisabledGeocoder))).await;
        let client = reqwest::Client::new();

        let requests = [
            // Broken JSON.
            client
                .post(format!("{}/api/v1/geocode", base))
                .header("content-type", "application/json")
                .body("{\"address\": "),
            // No content type.
            client
                .post(format!("{}/api/v1/accounts/register", base))
                .body("username=walker"),
            // Wrong field types.
            client
                .post(format!("{}/api/v1/accounts/login", base))
                .json(&serde_json::json!({"username": 1, "password": false})),
        ];

        for request in requests {
            let response = request.send().await.unwrap();
            assert_eq!(response.status(), 400);
            let body: serde_json::Value = response.json().await.unwrap();
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
        }
    }

    #[tokio::test]
    async fn test_geocode_found() {
        let kakao = kakao_server(
            serde_json::json!({
                "meta": {"total_count": 1},
                "documents": [{"x": "127.1522", "y": "36.8151"}]
            }),
            200,
        )
        .await;
        let base = spawn_test_server(test_state(kakao_geocoder(&kakao))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/v1/geocode", base))
            .json(&serde_json::json!({"address": "충남 천안시 동남구 중앙로 1"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["address"], "충남 천안시 동남구 중앙로 1");
        assert_eq!(body["latitude"], 36.8151);
        assert_eq!(body["longitude"], 127.1522);
    }

    #[tokio::test]
    async fn test_geocode_no_match_is_not_found() {
        let kakao = kakao_server(
            serde_json::json!({"meta": {"total_count": 0}, "documents": []}),
            200,
        )
        .await;
        let base = spawn_test_server(test_state(kakao_geocoder(&kakao))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/v1/geocode", base))
            .json(&serde_json::json!({"address": "없는 주소"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_geocode_upstream_failure_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("query", "천안시"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let base = spawn_test_server(test_state(kakao_geocoder(&server))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/v1/geocode", base))
            .json(&serde_json::json!({"address": "천안시"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
    }
}
