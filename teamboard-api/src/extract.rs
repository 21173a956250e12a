/// Request extractors
///
/// [`ValidatedJson`] parses a JSON body and runs its `validator` rules
/// before the handler sees it, so invalid input is rejected with a 422
/// before any core logic runs.
///
/// # Example
///
/// ```no_run
/// use serde::Deserialize;
/// use teamboard_api::extract::ValidatedJson;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct CreateTeam {
///     #[validate(length(min = 1, max = 100))]
///     name: String,
/// }
///
/// async fn handler(ValidatedJson(req): ValidatedJson<CreateTeam>) -> String {
///     req.name
/// }
/// ```

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ApiError::from)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Convert body rejections to API errors
///
/// Well-formed JSON of the wrong shape is a validation failure; anything
/// that is not JSON at all is a bad request.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::validation("body", err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Deserializes a present field into `Some`, including an explicit `null`
///
/// Used with `#[serde(default, deserialize_with = "double_option")]` on
/// `Option<Option<T>>` fields, so that an absent field (`None`) differs
/// from `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        color: Option<Option<String>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.color, None);

        let cleared: Patch = serde_json::from_str(r#"{"color": null}"#).unwrap();
        assert_eq!(cleared.color, Some(None));

        let set: Patch = serde_json::from_str(r##"{"color": "#ff0000"}"##).unwrap();
        assert_eq!(set.color, Some(Some("#ff0000".to_string())));
    }
}
