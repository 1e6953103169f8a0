//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::ApiError;

/// JSON body that is deserialized, then validated.
///
/// Malformed bodies and failed rules both come back as `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that is deserialized, then validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Trims a string and turns blanks into `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rejects strings that are empty once trimmed.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Rejects hours that do not fit a `NUMERIC(8, 2)` column.
pub fn hours_in_range(value: &Decimal) -> Result<(), ValidationError> {
    within(value, Decimal::new(99_999_999, 2))
}

/// Rejects amounts that do not fit a `NUMERIC(12, 2)` column.
pub fn amount_in_range(value: &Decimal) -> Result<(), ValidationError> {
    within(value, Decimal::new(999_999_999_999, 2))
}

fn within(value: &Decimal, max: Decimal) -> Result<(), ValidationError> {
    if value.round_dp(2).abs() > max {
        return Err(ValidationError::new("range")
            .with_message(format!("must be between -{max} and {max}").into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_blank() {
        assert!(non_blank("PY-101").is_ok());
        assert!(non_blank(" \t ").is_err());
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  Room 4 ".into())), Some("Room 4".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn test_decimal_bounds_follow_columns() {
        assert!(hours_in_range(&dec!(999999.99)).is_ok());
        assert!(hours_in_range(&dec!(1000000)).is_err());
        assert!(hours_in_range(&dec!(-1000000)).is_err());
        assert!(amount_in_range(&dec!(9999999999.99)).is_ok());
        assert!(amount_in_range(&dec!(10000000000)).is_err());
    }
}
