//! Route table: the access policy and rate-limit partition of every route.
//!
//! The router registers handlers on the same paths; the pipeline looks a
//! request up here by method and matched path template.

use axum::http::Method;

use crate::security::FIXED_PARTITION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Requires a valid bearer token.
    Protected,
}

/// Per-route pipeline metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    /// Name used as the request counter key.
    pub name: &'static str,
    pub access: Access,
    /// Named rate-limit partition applied on top of the global one.
    pub partition: Option<&'static str>,
}

impl RouteSpec {
    const fn public(name: &'static str) -> Self {
        Self {
            name,
            access: Access::Public,
            partition: None,
        }
    }

    const fn protected(name: &'static str) -> Self {
        Self {
            name,
            access: Access::Protected,
            partition: None,
        }
    }

    const fn limited(mut self, partition: &'static str) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn is_protected(&self) -> bool {
        self.access == Access::Protected
    }
}

pub const ROOT: &str = "/";
pub const USERS: &str = "/users";
pub const USER_BY_ID: &str = "/users/{id}";
pub const METRICS: &str = "/metrics";
pub const ERROR: &str = "/error";
pub const BOOM: &str = "/boom";

/// `RouteSpec` lookup by method and path template. Small enough to scan.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(Method, &'static str, RouteSpec)>,
}

impl RouteTable {
    /// The users API routes.
    pub fn standard() -> Self {
        let entries = [
            (Method::GET, ROOT, RouteSpec::public("GET /")),
            (
                Method::GET,
                USERS,
                RouteSpec::public("GET /users").limited(FIXED_PARTITION),
            ),
            (Method::GET, USER_BY_ID, RouteSpec::public("GET /users/{id}")),
            (Method::POST, USERS, RouteSpec::protected("POST /users")),
            (Method::PUT, USER_BY_ID, RouteSpec::protected("PUT /users/{id}")),
            (
                Method::DELETE,
                USER_BY_ID,
                RouteSpec::protected("DELETE /users/{id}"),
            ),
            (Method::GET, METRICS, RouteSpec::protected("GET /metrics")),
            (Method::GET, ERROR, RouteSpec::public("GET /error")),
            (Method::GET, BOOM, RouteSpec::public("GET /boom")),
        ];

        Self {
            routes: entries.into(),
        }
    }

    /// Resolve a request; `None` when it matched no known route.
    pub fn resolve(&self, method: &Method, matched_path: Option<&str>) -> Option<&RouteSpec> {
        let path = matched_path?;
        self.routes
            .iter()
            .find(|(m, p, _)| m == method && *p == path)
            .map(|(_, _, spec)| spec)
    }
}
