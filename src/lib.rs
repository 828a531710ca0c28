use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod policy;
pub mod repository;
pub mod service;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use mailer::{HttpMailer, MailerState, MockMailer};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockAssetStore, S3AssetStore, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application by
/// aggregating every path and schema decorated with the `#[utoipa::path]` and
/// `#[derive(utoipa::ToSchema)]` macros. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::signup, handlers::login, handlers::logout, handlers::verify_email,
        handlers::forgot_password, handlers::reset_password, handlers::get_me,
        handlers::update_profile, handlers::create_note, handlers::get_my_notes,
        handlers::get_public_notes, handlers::get_note_details, handlers::update_note,
        handlers::delete_note, handlers::get_presigned_upload, handlers::get_pending_notes,
        handlers::get_moderation_stats, handlers::approve_note, handlers::reject_note
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Note, models::NoteWithAuthor, models::UserProfile,
            models::SignupRequest, models::LoginRequest, models::VerifyEmailRequest,
            models::ForgotPasswordRequest, models::ResetPasswordRequest,
            models::UpdateProfileRequest, models::CreateNoteRequest,
            models::UpdateNoteRequest, models::PresignedUploadRequest,
            models::PresignedUploadResponse, models::ModerationStats, models::ApiMessage,
        )
    ),
    tags(
        (name = "notenest", description = "Multi-tenant note service API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, thread-safe, immutable
/// container holding all essential application services and configuration, shared
/// across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Storage Layer: abstracts the object store and presigned URL generation.
    pub storage: StorageState,
    /// Mailer: the outbound verification/reset mail collaborator.
    pub mailer: MailerState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow extractors and handlers to selectively pull components
// from the shared AppState, keeping dependency boundaries explicit.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: it attempts to extract `AuthUser` from the request. Since `AuthUser`
/// implements `FromRequestParts`, if authentication (cookie verification, store
/// lookup) fails, the extractor immediately rejects the request with a 401 before
/// the handler runs. If successful, the request proceeds.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: protected by the `auth_middleware`.
        // First layer of Defense-in-Depth for these routes.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: nested under '/api/admin'. The admin check itself is
        // performed in the moderation service after authentication resolves.
        .nest("/api/admin", admin::admin_routes())
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability, Correlation, and Gate Layers (applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a span
                // carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // 3d. Session Gate: route-class redirect policy over the page paths,
                // based on credential presence only.
                .layer(middleware::from_fn(gate::session_gate)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span creation: extracts the `x-request-id` header
/// (if present) and includes it in the structured logging metadata alongside the
/// HTTP method and URI, so every log line for one request correlates by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
