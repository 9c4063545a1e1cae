//! Configuration validation.
//!
//! Semantic checks only; serde already rejected malformed input. Every
//! problem is reported, not just the first.

use thiserror::Error;

use super::schema::{AppConfig, WindowConfig};

/// HS256 keys shorter than the hash output weaken the MAC.
pub const MIN_SIGNING_KEY_LEN: usize = 32;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: u64 = 8760;
/// One day.
pub const MAX_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,
    #[error("auth.{0} must not be empty")]
    EmptyAuthField(&'static str),
    #[error("auth.signing_key must be at least 32 bytes (got {0})")]
    SigningKeyTooShort(usize),
    #[error("auth.token_ttl_hours must be > 0")]
    ZeroTokenTtl,
    #[error("auth.token_ttl_hours must be <= 8760 (got {0})")]
    TokenTtlTooLong(u64),
    #[error("rate_limit.{0}.permit_limit must be > 0")]
    ZeroPermitLimit(&'static str),
    #[error("rate_limit.{0}.window_secs must be > 0")]
    ZeroWindow(&'static str),
    #[error("rate_limit.{0}.window_secs must be <= 86400 (got {1})")]
    WindowTooLong(&'static str, u64),
    #[error("logging.directory must not be empty when file logging is enabled")]
    EmptyLogDirectory,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    let auth = &config.auth;
    if auth.issuer.trim().is_empty() {
        errors.push(ValidationError::EmptyAuthField("issuer"));
    }
    if auth.audience.trim().is_empty() {
        errors.push(ValidationError::EmptyAuthField("audience"));
    }
    if auth.signing_key.len() < MIN_SIGNING_KEY_LEN {
        errors.push(ValidationError::SigningKeyTooShort(auth.signing_key.len()));
    }
    if auth.token_ttl_hours == 0 {
        errors.push(ValidationError::ZeroTokenTtl);
    } else if auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
        errors.push(ValidationError::TokenTtlTooLong(auth.token_ttl_hours));
    }

    check_window("global", &config.rate_limit.global, &mut errors);
    check_window("list_users", &config.rate_limit.list_users, &mut errors);

    if config.logging.file_enabled && config.logging.directory.trim().is_empty() {
        errors.push(ValidationError::EmptyLogDirectory);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_window(name: &'static str, window: &WindowConfig, errors: &mut Vec<ValidationError>) {
    if window.permit_limit == 0 {
        errors.push(ValidationError::ZeroPermitLimit(name));
    }
    if window.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow(name));
    } else if window.window_secs > MAX_WINDOW_SECS {
        errors.push(ValidationError::WindowTooLong(name, window.window_secs));
    }
}
