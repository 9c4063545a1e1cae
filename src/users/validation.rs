//! Structural validation of user payloads.
//!
//! Rules run in a fixed order and the first failure is reported:
//! payload present, id, first name, last name, age.

use thiserror::Error;

use super::model::User;

/// The first rule a user payload failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("User payload is missing!")]
    MissingPayload,
    #[error("Id must be > 0!")]
    InvalidId,
    #[error("FirstName is required!")]
    MissingFirstName,
    #[error("LastName is required!")]
    MissingLastName,
    #[error("Age must be > 0!")]
    InvalidAge,
}

/// Check a user payload before it may enter the store.
pub fn validate(user: Option<&User>) -> Result<(), ValidationError> {
    let user = user.ok_or(ValidationError::MissingPayload)?;

    if user.id <= 0 {
        return Err(ValidationError::InvalidId);
    }
    if user.first_name.trim().is_empty() {
        return Err(ValidationError::MissingFirstName);
    }
    if user.last_name.trim().is_empty() {
        return Err(ValidationError::MissingLastName);
    }
    if user.age <= 0 {
        return Err(ValidationError::InvalidAge);
    }

    Ok(())
}
