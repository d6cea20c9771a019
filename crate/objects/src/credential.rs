use std::fmt::{self, Debug, Formatter};

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An access credential: an optional username and password.
/// Both are wiped from memory when the credential is dropped.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl Credential {
    #[must_use]
    pub fn new(username: Option<&str>, password: Option<&str>) -> Self {
        Self {
            username: username.map(ToOwned::to_owned),
            password: password.map(ToOwned::to_owned),
        }
    }

    /// A credential carrying only a password
    #[must_use]
    pub fn with_password(password: &str) -> Self {
        Self::new(None, Some(password))
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn test_credential_debug_redacts_password() {
        let credential = Credential::new(Some("admin"), Some("secret"));
        assert_eq!(credential.password(), Some("secret"));
        let debug = format!("{credential:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }
}
