//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the shared services (store, counter, limiter, tokens, logger)
//! - Create Axum Router with all handlers
//! - Wire up middleware (request id, tracing, request pipeline)
//! - Serve until shutdown, then drain the request log

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::pipeline::{dispatch, Pipeline};
use crate::http::routes::{BOOM, ERROR, METRICS, ROOT, USERS, USER_BY_ID};
use crate::observability::{FileLogSink, RequestCounter, RequestLogger};
use crate::security::{FixedWindowLimiter, TokenService};
use crate::users::{handlers as users, UserStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
    pub counter: RequestCounter,
    pub tokens: Arc<TokenService>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub logger: RequestLogger,
}

impl AppState {
    /// Build every shared service from `config`. Request logs go to `logger`.
    pub fn from_config(config: &AppConfig, logger: RequestLogger) -> Self {
        let store = if config.store.seed_sample_users {
            UserStore::with_sample_users()
        } else {
            UserStore::new()
        };

        Self {
            store,
            counter: RequestCounter::new(),
            tokens: Arc::new(TokenService::from_config(&config.auth)),
            limiter: Arc::new(FixedWindowLimiter::from_config(&config.rate_limit)),
            logger,
        }
    }
}

impl FromRef<AppState> for UserStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for RequestCounter {
    fn from_ref(state: &AppState) -> Self {
        state.counter.clone()
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let pipeline = Arc::new(Pipeline::new(
        state.counter.clone(),
        state.tokens.clone(),
        state.limiter.clone(),
        state.logger.clone(),
    ));

    Router::new()
        .route(ROOT, get(handlers::root))
        .route(USERS, get(users::list_users).post(users::create_user))
        .route(
            USER_BY_ID,
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(METRICS, get(handlers::metrics))
        .route(ERROR, get(handlers::error))
        .route(BOOM, get(handlers::boom))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(pipeline, dispatch))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// HTTP server for the users API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    state: AppState,
    log_writer: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Must be called inside a Tokio runtime when file logging is enabled.
    pub fn new(config: AppConfig) -> Self {
        let (logger, log_writer) = if config.logging.file_enabled {
            let (sink, handle) = FileLogSink::spawn(&config.logging.directory);
            (RequestLogger::new(Some(sink)), Some(handle))
        } else {
            (RequestLogger::default(), None)
        };

        let state = AppState::from_config(&config, logger);
        let router = build_router(state.clone());

        Self {
            router,
            config,
            state,
            log_writer,
        }
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let Self {
            router,
            state,
            log_writer,
            ..
        } = self;
        // Only the router may keep the log sink alive once serving stops.
        drop(state);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(handle) = log_writer {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Request log writer ended abnormally");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the shared services, e.g. to issue tokens at startup.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// A clone of the router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
