//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the users API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token issuance and verification.
    pub auth: AuthConfig,

    /// Fixed-window rate limiting policies.
    pub rate_limit: RateLimitConfig,

    /// Request log files and log level.
    pub logging: LoggingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// In-memory store settings.
    pub store: StoreConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Token settings shared by issuer and verifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Expected `iss` claim.
    pub issuer: String,

    /// Expected `aud` claim.
    pub audience: String,

    /// HMAC-SHA256 shared secret.
    pub signing_key: String,

    /// Lifetime of issued tokens.
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "users-api".to_string(),
            audience: "users-api-clients".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            signing_key: "CHANGE_ME_IN_PRODUCTION_32_BYTES_MIN".to_string(),
            token_ttl_hours: 24,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Applied to every request.
    pub global: WindowConfig,

    /// Applied additionally to `GET /users`.
    pub list_users: WindowConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: WindowConfig {
                permit_limit: 100,
                window_secs: 60,
                queue_limit: 3,
            },
            list_users: WindowConfig {
                permit_limit: 3,
                window_secs: 10,
                queue_limit: 0,
            },
        }
    }
}

/// One fixed-window policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WindowConfig {
    /// Requests admitted per window.
    pub permit_limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Extra requests admitted against the next window.
    #[serde(default)]
    pub queue_limit: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub level: String,

    /// Write daily request/error log files.
    pub file_enabled: bool,

    /// Directory for the daily log files.
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: true,
            directory: "Logs".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Insert the three sample users at startup.
    pub seed_sample_users: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_sample_users: true,
        }
    }
}
