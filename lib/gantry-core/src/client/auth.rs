use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secure wrapper for sensitive string data that zeroes memory on drop.
///
/// Bearer credentials read from the environment pass through this wrapper so
/// they are cleared once the harness is done with them.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner value.
    ///
    /// The returned reference should not be stored for extended periods.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// Default authentication attached to every request issued by a client.
///
/// Only bearer credentials are supported; the control plane under test does
/// not use any other scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// `Authorization: Bearer <token>`
    Bearer(SecureString),
}

impl Authentication {
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Bearer(token) => request.bearer_auth(token.as_str()),
        }
    }
}
