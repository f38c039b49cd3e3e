//! Response status classification.

use http::StatusCode;

use crate::ErrorKind;

/// Classifies a completed response's status code.
///
/// Runs on every response, on every attempt. A rejected status ends the call: it is
/// never retried.
pub trait ResponseValidator: Send + Sync {
    fn validate(&self, status: StatusCode) -> Result<(), ErrorKind>;
}

/// Accepts 2xx and maps well-known error statuses to their [`ErrorKind`].
///
/// # Examples
///
/// ```
/// use relaycall::{DefaultResponseValidator, ErrorKind, ResponseValidator};
/// use http::StatusCode;
///
/// let validator = DefaultResponseValidator;
/// assert!(validator.validate(StatusCode::NO_CONTENT).is_ok());
/// assert_eq!(validator.validate(StatusCode::NOT_FOUND), Err(ErrorKind::NotFound));
/// assert_eq!(validator.validate(StatusCode::IM_A_TEAPOT), Err(ErrorKind::BadResponse(418)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseValidator;

impl ResponseValidator for DefaultResponseValidator {
    fn validate(&self, status: StatusCode) -> Result<(), ErrorKind> {
        match status.as_u16() {
            200..=299 => Ok(()),
            400 => Err(ErrorKind::BadRequest),
            401 => Err(ErrorKind::Unauthorized),
            403 => Err(ErrorKind::Forbidden),
            404 => Err(ErrorKind::NotFound),
            408 => Err(ErrorKind::RequestTimeout),
            429 => Err(ErrorKind::TooManyRequests),
            500 => Err(ErrorKind::InternalServerError),
            503 => Err(ErrorKind::ServiceUnavailable),
            code => Err(ErrorKind::BadResponse(code)),
        }
    }
}
