//! Route handlers for the `/users` resource.
//!
//! Every expected failure is returned as an `ApiError`; nothing here panics
//! on bad input.

use axum::{
    body::Bytes,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::http::error::ApiError;
use super::model::{ListFilter, User};
use super::store::UserStore;
use super::validation::{validate, ValidationError};

/// `GET /users?search=&isCustomer=`
pub async fn list_users(
    State(store): State<UserStore>,
    Query(filter): Query<ListFilter>,
) -> Json<Vec<User>> {
    Json(store.list_all(&filter))
}

/// `GET /users/{id}`
pub async fn get_user(
    State(store): State<UserStore>,
    UserId(id): UserId,
) -> Result<Json<User>, ApiError> {
    check_id(id)?;
    store.get(id).map(Json).ok_or(ApiError::NotFound(id))
}

/// `POST /users`
pub async fn create_user(
    State(store): State<UserStore>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let user = parse_payload(&body)?;
    validate(user.as_ref())?;
    let user = user.ok_or(ValidationError::MissingPayload)?;

    if !store.try_add(user.id, user.clone()) {
        return Err(ApiError::Conflict(format!(
            "User with Id {} already exists.",
            user.id
        )));
    }

    tracing::debug!(user_id = user.id, "User created");
    let location = format!("/users/{}", user.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)))
}

/// `PUT /users/{id}`
///
/// The body is validated as sent; its id is then replaced by the path id.
pub async fn update_user(
    State(store): State<UserStore>,
    UserId(id): UserId,
    body: Bytes,
) -> Result<Json<User>, ApiError> {
    check_id(id)?;

    let user = parse_payload(&body)?;
    validate(user.as_ref())?;
    let mut user = user.ok_or(ValidationError::MissingPayload)?;
    user.id = id;

    let existing = store.get(id).ok_or(ApiError::NotFound(id))?;

    if !store.try_update(id, user.clone(), &existing) {
        tracing::warn!(user_id = id, "Concurrent modification detected");
        return Err(ApiError::Conflict(format!(
            "User with Id {id} could not be updated due to a concurrent modification."
        )));
    }

    Ok(Json(user))
}

/// `DELETE /users/{id}`
pub async fn delete_user(
    State(store): State<UserStore>,
    UserId(id): UserId,
) -> Result<Json<String>, ApiError> {
    check_id(id)?;
    store
        .try_remove(id)
        .map(|_| Json(format!("User with Id {id} deleted.")))
        .ok_or(ApiError::NotFound(id))
}

/// The `{id}` path segment. Anything that is not an `i32` does not match
/// the route and is answered with 404.
pub struct UserId(pub i32);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i32>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(UserId(id)),
            Err(rejection) => {
                tracing::debug!(path = %parts.uri.path(), error = %rejection, "Unmatched user id");
                Err(ApiError::RouteNotFound)
            }
        }
    }
}

fn check_id(id: i32) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(ApiError::Validation("Id must be > 0.".to_string()));
    }
    Ok(())
}

/// Decode a JSON body. An empty body or a literal `null` is a missing payload.
fn parse_payload(body: &Bytes) -> Result<Option<User>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<User>>(body)
        .map_err(|e| ApiError::Validation(format!("Malformed user payload: {e}")))
}
