//! Locators designate where the persisted form of an object lives.

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
};

use url::Url;

use crate::{PkiError, PkiResult};

/// The schemes a locator can designate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorScheme {
    File,
    Id,
    Pkcs11,
    Http,
    Https,
    Ldap,
    Other,
}

/// An addressable reference to a persisted object, e.g. `file:///etc/pki/key.pem`
/// or `id://signing-key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    url: Url,
}

impl Locator {
    /// Parse a locator.
    /// Strings without a scheme are treated as filesystem paths.
    pub fn parse(locator: &str) -> PkiResult<Self> {
        match Url::parse(locator) {
            Ok(url) => Ok(Self { url }),
            Err(url::ParseError::RelativeUrlWithoutBase) => Self::from_path(locator),
            Err(e) => Err(PkiError::Locator(format!("{locator}: {e}"))),
        }
    }

    /// A `file` locator for the given path, made absolute if needed
    pub fn from_path<P: AsRef<Path>>(path: P) -> PkiResult<Self> {
        let absolute = std::path::absolute(path.as_ref())?;
        let url = Url::from_file_path(&absolute).map_err(|()| {
            PkiError::Locator(format!("invalid file path: {}", absolute.display()))
        })?;
        Ok(Self { url })
    }

    #[must_use]
    pub fn scheme(&self) -> LocatorScheme {
        match self.url.scheme() {
            "file" => LocatorScheme::File,
            "id" => LocatorScheme::Id,
            "pkcs11" => LocatorScheme::Pkcs11,
            "http" => LocatorScheme::Http,
            "https" => LocatorScheme::Https,
            "ldap" | "ldaps" => LocatorScheme::Ldap,
            _ => LocatorScheme::Other,
        }
    }

    /// The address portion of the locator: the path for `file` locators,
    /// the host and path otherwise (`id://signing-key` → `signing-key`).
    #[must_use]
    pub fn address(&self) -> String {
        if self.scheme() == LocatorScheme::File {
            if let Some(path) = self.file_path() {
                return path.to_string_lossy().into_owned();
            }
        }
        match self.url.host_str() {
            Some(host) => format!("{host}{}", self.url.path().trim_end_matches('/')),
            None => self.url.path().to_owned(),
        }
    }

    /// The explicit port or the scheme's well-known port
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    /// The filesystem path of a `file` locator
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.scheme() != LocatorScheme::File {
            return None;
        }
        self.url.to_file_path().ok()
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
