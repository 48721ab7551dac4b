//! JSON body extraction with field validation.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use super::error::ApiError;

/// Validate a request body, returning a field-keyed 422 on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate()
        .map_err(|e| ApiError::validation_failed(field_messages(&e)))
}

/// One message per failing field.
fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let msg = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid", field));
            Some((field.to_string(), msg))
        })
        .collect()
}

/// `Json<T>` that also runs `T::validate`.
///
/// Any decode failure (bad JSON, missing field, wrong content type) becomes
/// the generic invalid payload error.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // The rejection text can quote the submitted body, so it is not logged.
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|_| {
            debug!("Rejected request body: not decodable");
            ApiError::invalid_payload()
        })?;
        validate_request(&value)?;
        Ok(ValidatedJson(value))
    }
}
