use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use aula_core::AppError;

/// JSON extractor that runs `validator` rules after deserialization.
///
/// Handlers taking `ValidatedJson<T>` reject structurally valid payloads
/// that fail the DTO's validation attributes before any service code runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(anyhow::anyhow!("{}", rejection.body_text())))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
