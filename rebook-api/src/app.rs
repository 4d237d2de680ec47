/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use rebook_api::{app::AppState, config::Config};
/// use rebook_shared::auth::identity::MemoryIdentity;
/// use rebook_shared::store::MemoryStore;
/// use rebook_shared::whatsapp::mock::MockMessenger;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MockMessenger::new()),
///     Arc::new(MemoryIdentity::new()),
///     config,
/// );
/// let app = rebook_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use rebook_shared::auth::context::AuthContext;
use rebook_shared::auth::identity::DynIdentityProvider;
use rebook_shared::auth::jwt;
use rebook_shared::auth::session::{AuthEvents, SessionService};
use rebook_shared::retention::dispatch::CampaignDispatcher;
use rebook_shared::store::DynStore;
use rebook_shared::whatsapp::DynMessenger;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; every field is a
/// cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,

    /// Sign-up, sign-in and the auth event channel
    pub sessions: SessionService,

    pub dispatcher: CampaignDispatcher,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: DynStore,
        messenger: DynMessenger,
        identity: DynIdentityProvider,
        config: Config,
    ) -> Self {
        let sessions = SessionService::new(store.clone(), identity, AuthEvents::default());
        let dispatcher =
            CampaignDispatcher::new(store.clone(), messenger, config.message_settings());

        Self {
            store,
            sessions,
            dispatcher,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn auth_events(&self) -> &AuthEvents {
        self.sessions.events()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── POST /send-reminder               # ownership checked against body salonId
/// └── /v1/
///     ├── POST /auth/{signup,login,refresh}
///     └── (JWT required)
///         ├── POST /auth/logout
///         ├── /customers, /customers/all, /customers/:id
///         ├── /customers/:id/history, /customers/:id/history/:history_id
///         ├── /templates, /templates/:id
///         ├── /campaigns, /campaigns/:id, /campaigns/:id/due, /campaigns/:id/send
///         ├── /salon, /salon/whatsapp
///         └── /dashboard/stats
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route(
            "/customers",
            get(routes::customers::list_customers).post(routes::customers::create_customer),
        )
        .route("/customers/all", get(routes::customers::list_all_customers))
        .route(
            "/customers/:id",
            get(routes::customers::get_customer)
                .put(routes::customers::update_customer)
                .delete(routes::customers::delete_customer),
        )
        .route(
            "/customers/:id/history",
            get(routes::history::list_history).post(routes::history::add_history),
        )
        .route(
            "/customers/:id/history/:history_id",
            delete(routes::history::delete_history),
        )
        .route(
            "/templates",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route(
            "/templates/:id",
            get(routes::templates::get_template)
                .put(routes::templates::update_template)
                .delete(routes::templates::delete_template),
        )
        .route(
            "/campaigns",
            get(routes::campaigns::list_campaigns).post(routes::campaigns::create_campaign),
        )
        .route(
            "/campaigns/:id",
            get(routes::campaigns::get_campaign)
                .put(routes::campaigns::update_campaign)
                .delete(routes::campaigns::delete_campaign),
        )
        .route("/campaigns/:id/due", get(routes::campaigns::due_customers))
        .route("/campaigns/:id/send", post(routes::campaigns::send_campaign))
        .route(
            "/salon",
            get(routes::salon::get_salon).put(routes::salon::update_salon),
        )
        .route("/salon/whatsapp", put(routes::salon::save_whatsapp))
        .route("/dashboard/stats", get(routes::dashboard::stats))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/send-reminder", post(routes::reminders::send_reminder))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects an [`AuthContext`] into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;
    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
