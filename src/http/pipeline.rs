//! Request pipeline.
//!
//! # Stage Order (outer to inner)
//! ```text
//! dispatch
//!   ├─ fault translation   panic → 500 {error, traceId}
//!   │    ├─ CountRequests  per-route counter
//!   │    ├─ Authenticate   bearer token on protected routes
//!   │    ├─ Authorize      authenticated ⇒ allowed
//!   │    ├─ RateLimit      global, then the route's partition
//!   │    └─ handler
//!   └─ request log         exactly once, after everything above
//! ```
//!
//! The middle stages are data: an ordered `Vec<Box<dyn Stage>>` run by
//! `dispatch`. Any stage may short-circuit with an `ApiError`.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Once};

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::routes::{RouteSpec, RouteTable};
use crate::observability::counter::UNKNOWN_ROUTE;
use crate::observability::logging::Fault;
use crate::observability::{metrics, RequestCounter, RequestLogger};
use crate::security::token::{bearer_token, TokenError};
use crate::security::{FixedWindowLimiter, Principal, TokenService, GLOBAL_PARTITION};

/// Header carrying the request id set by tower-http.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Trace id of the current request, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

/// One cross-cutting check run before the handler.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect (and possibly annotate) the request; `Err` ends the request.
    fn apply(&self, route: Option<&RouteSpec>, request: &mut Request<Body>) -> Result<(), ApiError>;
}

/// Counts every request under its route name.
pub struct CountRequests {
    pub counter: RequestCounter,
}

impl Stage for CountRequests {
    fn name(&self) -> &'static str {
        "count"
    }

    fn apply(&self, route: Option<&RouteSpec>, _request: &mut Request<Body>) -> Result<(), ApiError> {
        self.counter.increment(route.map(|r| r.name));
        Ok(())
    }
}

/// Verifies the bearer token of protected routes and attaches the `Principal`.
pub struct Authenticate {
    pub tokens: Arc<TokenService>,
}

impl Stage for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn apply(&self, route: Option<&RouteSpec>, request: &mut Request<Body>) -> Result<(), ApiError> {
        if !route.is_some_and(RouteSpec::is_protected) {
            return Ok(());
        }

        let header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let principal = bearer_token(header).and_then(|token| self.tokens.verify(token));
        match principal {
            Ok(principal) => {
                tracing::debug!(subject = %principal.subject, role = %principal.role, "Authenticated");
                request.extensions_mut().insert(principal);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(reason = %e, path = %request.uri().path(), "Authentication failed");
                Err(ApiError::Unauthenticated(e))
            }
        }
    }
}

/// Any authenticated principal may use any protected route.
pub struct Authorize;

impl Stage for Authorize {
    fn name(&self) -> &'static str {
        "authorize"
    }

    fn apply(&self, route: Option<&RouteSpec>, request: &mut Request<Body>) -> Result<(), ApiError> {
        if !route.is_some_and(RouteSpec::is_protected) {
            return Ok(());
        }
        match request.extensions().get::<Principal>() {
            Some(_) => Ok(()),
            None => Err(ApiError::Unauthenticated(TokenError::Missing)),
        }
    }
}

/// Global partition always; the route's named partition when it has one.
pub struct RateLimit {
    pub limiter: Arc<FixedWindowLimiter>,
}

impl Stage for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn apply(&self, route: Option<&RouteSpec>, _request: &mut Request<Body>) -> Result<(), ApiError> {
        let mut partitions = vec![GLOBAL_PARTITION];
        if let Some(partition) = route.and_then(|r| r.partition) {
            partitions.push(partition);
        }

        self.limiter
            .try_acquire_all(&partitions)
            .map_err(|rejection| ApiError::RateLimited {
                retry_after: rejection.retry_after,
            })
    }
}

/// The composed pipeline shared by every request.
pub struct Pipeline {
    routes: RouteTable,
    stages: Vec<Box<dyn Stage>>,
    logger: RequestLogger,
}

impl Pipeline {
    /// Build the pipeline with the standard stage order.
    pub fn new(
        counter: RequestCounter,
        tokens: Arc<TokenService>,
        limiter: Arc<FixedWindowLimiter>,
        logger: RequestLogger,
    ) -> Self {
        install_backtrace_hook();
        Self {
            routes: RouteTable::standard(),
            stages: vec![
                Box::new(CountRequests { counter }),
                Box::new(Authenticate { tokens }),
                Box::new(Authorize),
                Box::new(RateLimit { limiter }),
            ],
            logger,
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    async fn run_inner(
        &self,
        route: Option<RouteSpec>,
        mut request: Request<Body>,
        next: Next,
    ) -> Response {
        for stage in &self.stages {
            if let Err(err) = stage.apply(route.as_ref(), &mut request) {
                tracing::debug!(stage = stage.name(), error = %err, "Request short-circuited");
                return err.into_response();
            }
        }
        next.run(request).await
    }
}

/// Middleware entry point running the whole pipeline for one request.
pub async fn dispatch(
    State(pipeline): State<Arc<Pipeline>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let trace_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let route = pipeline
        .routes
        .resolve(&method, request.extensions().get::<MatchedPath>().map(MatchedPath::as_str))
        .copied();

    let outcome = AssertUnwindSafe(pipeline.run_inner(route, request, next))
        .catch_unwind()
        .await;

    let (response, fault) = match outcome {
        Ok(response) => (response, None),
        Err(payload) => {
            metrics::record_fault();
            let fault = Fault {
                trace_id: trace_id.clone(),
                detail: fault_detail(panic_message(payload.as_ref()), take_backtrace()),
            };
            (ApiError::Internal(trace_id).into_response(), Some(fault))
        }
    };

    let status = response.status().as_u16();
    metrics::record_request(
        method.as_str(),
        route.map_or(UNKNOWN_ROUTE, |r| r.name),
        status,
    );
    pipeline.logger.record(method.as_str(), &path, status, fault.as_ref());

    response
}

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

/// Chain a panic hook that keeps the panicking thread's backtrace for
/// `dispatch`. The unwind is caught on the same thread, so a thread local
/// is enough.
fn install_backtrace_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

fn take_backtrace() -> Option<Backtrace> {
    LAST_BACKTRACE.with(|slot| slot.borrow_mut().take())
}

fn fault_detail(message: String, backtrace: Option<Backtrace>) -> String {
    match backtrace {
        Some(backtrace) => format!("{message}\nStack trace:\n{backtrace}"),
        None => message,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
