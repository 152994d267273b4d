use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query,
    },
    http::{request::Parts, Request, StatusCode},
    Json,
};
use axum_derive_error::ErrorResponse;
use derive_more::{Display, Error};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// Errors related to request input validation.
#[derive(ErrorResponse, Display, Error)]
pub enum ValidationRejection {
    /// Unable to parse a JSON value.
    #[status(StatusCode::BAD_REQUEST)]
    JsonParsingError(JsonRejection),

    /// Unable to parse a query string.
    #[status(StatusCode::BAD_REQUEST)]
    QueryParsingError(QueryRejection),

    /// Unable to validate a parsed value.
    #[status(StatusCode::BAD_REQUEST)]
    ValidationError(ValidationErrors),
}

/// Wrapper for [`axum`] JSON value validation.
///
/// Equivalent to the [`axum`]'s [`Json`] struct
/// with [`validator`] crate support.
///
/// [`Json`]: axum::extract::Json
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: Validate,
    B: Send + 'static,
    S: Sync,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::from_request(req, state)
            .await
            .map_err(ValidationRejection::JsonParsingError)?;

        match value.validate() {
            Ok(_) => Ok(ValidatedJson(value)),
            Err(err) => Err(ValidationRejection::ValidationError(err)),
        }
    }
}

/// Wrapper for [`axum`] query string validation.
///
/// Equivalent to the [`axum`]'s [`Query`] struct
/// with [`validator`] crate support.
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: Validate + DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::QueryParsingError)?;

        match value.validate() {
            Ok(_) => Ok(ValidatedQuery(value)),
            Err(err) => Err(ValidationRejection::ValidationError(err)),
        }
    }
}
