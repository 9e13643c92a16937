//! Identity — who is calling, and how sign-in failures are reported.
//!
//! OAuth itself happens upstream (popup flow in the browser, token checks in the
//! gateway). The service only ever sees the resulting user id.

use std::fmt;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

pub mod session;

/// Identifier of an authenticated user as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the current user for a request. `None` means anonymous.
///
/// Carried in `AppState` as `Arc<dyn IdentityProvider>`.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, parts: &Parts) -> Option<UserId>;
}

/// Trusts a header set by the OAuth-terminating gateway in front of the service.
pub struct HeaderIdentityProvider {
    header: HeaderName,
}

impl HeaderIdentityProvider {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn identify(&self, parts: &Parts) -> Option<UserId> {
        let value = parts.headers.get(&self.header)?.to_str().ok()?.trim();
        if value.is_empty() {
            None
        } else {
            Some(UserId::from(value))
        }
    }
}

/// Extractor for handlers that require a signed-in caller.
/// Use `Option<AuthUser>` where anonymous callers are allowed.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        state
            .identity
            .identify(parts)
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sign-in failures
// ────────────────────────────────────────────────────────────────────────────

/// Classified outcome of a failed sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInFailure {
    /// The user dismissed the popup. Not an error from their point of view.
    UserCancelled,
    /// The provider is not set up for this app. Blocks sign-in entirely.
    Configuration { code: String },
    Other { code: String },
}

impl SignInFailure {
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/popup-closed-by-user" | "auth/cancelled-popup-request" | "auth/user-cancelled" => {
                SignInFailure::UserCancelled
            }
            "auth/operation-not-allowed"
            | "auth/unauthorized-domain"
            | "auth/configuration-not-found"
            | "auth/invalid-api-key" => SignInFailure::Configuration {
                code: code.to_string(),
            },
            other => SignInFailure::Other {
                code: other.to_string(),
            },
        }
    }

    /// Message to show the user, if any. Cancellation is silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            SignInFailure::UserCancelled => None,
            SignInFailure::Configuration { code } => Some(format!(
                "Configuration error ({code}): Google sign-in is not enabled for this app. \
                 Enable it in the identity provider console under Authentication > Sign-in method."
            )),
            SignInFailure::Other { .. } => {
                Some("Failed to sign in. Please try again.".to_string())
            }
        }
    }
}
