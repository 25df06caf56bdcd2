//! Conversions from external infrastructure errors into domain errors.

use azauth_domain::AuthError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AuthError);

impl From<InfraError> for AuthError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AuthError> for InfraError {
    fn from(value: AuthError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAuthError {
    fn into_auth(self) -> AuthError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AuthError */
/* -------------------------------------------------------------------------- */

impl IntoAuthError for HttpError {
    fn into_auth(self) -> AuthError {
        if self.is_timeout() {
            return AuthError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return AuthError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return AuthError::Internal(format!("unexpected response body: {self}"));
        }

        if let Some(status) = self.status() {
            return AuthError::Network(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        AuthError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → AuthError */
/* -------------------------------------------------------------------------- */

impl IntoAuthError for std::io::Error {
    fn into_auth(self) -> AuthError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => AuthError::Storage(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => AuthError::Storage(format!("permission denied: {self}")),
            _ => AuthError::Storage(self.to_string()),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AuthError */
/* -------------------------------------------------------------------------- */

impl IntoAuthError for serde_json::Error {
    fn into_auth(self) -> AuthError {
        AuthError::Storage(format!("invalid JSON at line {} column {}: {self}", self.line(), self.column()))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* jsonwebtoken / pem → AuthError */
/* -------------------------------------------------------------------------- */

impl From<jsonwebtoken::errors::Error> for InfraError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        InfraError(AuthError::Config(format!("certificate assertion failed: {value}")))
    }
}

impl From<pem::PemError> for InfraError {
    fn from(value: pem::PemError) -> Self {
        InfraError(AuthError::Config(format!("certificate file is not valid PEM: {value}")))
    }
}

/// `?`-friendly conversion into the domain error for any supported source.
pub(crate) fn to_auth<E>(err: E) -> AuthError
where
    InfraError: From<E>,
{
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
