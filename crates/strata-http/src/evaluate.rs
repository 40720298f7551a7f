//! Maps API error responses to typed errors.
//!
//! Failures come back as `{"detail": [{"msg": ..., "type": ...}]}`; the
//! message/type pair identifies the failure class. Unknown pairs and
//! envelopes that do not parse degrade to generic variants instead of
//! being dropped.

use reqwest::Response;
use strata_types::{ApiError, ErrorEnvelope, Result, StrataError};

/// Passes successful responses through and converts everything else into a
/// typed [`ApiError`].
///
/// # Errors
///
/// Returns the mapped API error for any non-2xx status.
pub async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StrataError::Api(classify(status.as_u16(), &body)))
}

/// Classifies an error response from its status code and body.
#[must_use]
pub fn classify(status: u16, body: &str) -> ApiError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return ApiError::Status { status };
    };
    let Some(detail) = envelope.detail.first() else {
        return ApiError::Status { status };
    };

    match (detail.msg.as_str(), detail.error_type.as_str()) {
        ("Sorry, something went wrong. Please try again later.", "value_error.all") => {
            ApiError::Server
        }
        ("This data stream does not exist.", "data_warning.empty") => ApiError::StreamNotFound,
        ("This data service does not exist.", "data_warning.empty") => ApiError::ServiceNotFound,
        ("You are not authorized to access this resource.", "authorization_error.missing") => {
            ApiError::NotAuthorized
        }
        ("We could not find any data streams.", "data_warning.empty") => ApiError::NoStreamsFound,
        ("The data version you provided does not exist.", "data_warning.empty") => {
            ApiError::VersionNotFound
        }
        (
            "The input data you provided is not supported for creating a data stream.",
            "data_warning.empty",
        ) => ApiError::UnsupportedInput,
        ("A data stream with the given unique label already exists.", "data_warning.error") => {
            ApiError::UniqueLabelConflict
        }
        (
            "Cannot rollback to this data version due to schema change, store update or because it's the most data recent version.",
            "data_warning.error",
        ) => ApiError::UnsupportedRollback,
        ("The secret that you provided is invalid.", "data_warning.error") => {
            ApiError::InvalidRecoverySecret
        }
        ("Could not validate credentials.", "authentication_error.missing") => {
            ApiError::Unauthenticated
        }
        (msg, "value_error.invalid") => ApiError::InvalidParameters(msg.to_string()),
        (msg, error_type) => ApiError::Unrecognized {
            error_type: error_type.to_string(),
            message: msg.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(msg: &str, error_type: &str) -> String {
        format!(r#"{{"detail":[{{"loc":"","msg":"{msg}","type":"{error_type}"}}]}}"#)
    }

    #[test]
    fn test_classify_stream_not_found() {
        let body = envelope("This data stream does not exist.", "data_warning.empty");
        assert_eq!(classify(404, &body), ApiError::StreamNotFound);
    }

    #[test]
    fn test_classify_version_not_found() {
        let body = envelope(
            "The data version you provided does not exist.",
            "data_warning.empty",
        );
        assert_eq!(classify(404, &body), ApiError::VersionNotFound);
    }

    #[test]
    fn test_classify_unauthenticated() {
        let body = envelope("Could not validate credentials.", "authentication_error.missing");
        assert_eq!(classify(401, &body), ApiError::Unauthenticated);
    }

    #[test]
    fn test_classify_not_authorized() {
        let body = envelope(
            "You are not authorized to access this resource.",
            "authorization_error.missing",
        );
        assert_eq!(classify(401, &body), ApiError::NotAuthorized);
    }

    #[test]
    fn test_classify_unique_label_conflict() {
        let body = envelope(
            "A data stream with the given unique label already exists.",
            "data_warning.error",
        );
        assert_eq!(classify(409, &body), ApiError::UniqueLabelConflict);
    }

    #[test]
    fn test_classify_invalid_sort_parameters() {
        let body = envelope(
            "The sort parameters you provided are invalid.",
            "value_error.invalid",
        );
        assert_eq!(
            classify(422, &body),
            ApiError::InvalidParameters("The sort parameters you provided are invalid.".to_string())
        );
    }

    #[test]
    fn test_classify_unknown_pair() {
        let body = envelope("Something new.", "data_warning.novel");
        match classify(400, &body) {
            ApiError::Unrecognized { error_type, message } => {
                assert_eq!(error_type, "data_warning.novel");
                assert_eq!(message, "Something new.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_classify_unparseable_body() {
        assert_eq!(
            classify(502, "<html>Bad Gateway</html>"),
            ApiError::Status { status: 502 }
        );
        assert_eq!(classify(500, r#"{"detail":[]}"#), ApiError::Status { status: 500 });
    }
}
