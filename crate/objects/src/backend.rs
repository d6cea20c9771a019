//! Backends.
//! A backend is the provider a generic object is bound to: the native software
//! provider, or an engine fronting a hardware security module.

use std::fmt::{self, Debug, Formatter};

use pki_logger::{debug, trace};
use zeroize::Zeroizing;

use crate::{Credential, GenericObject, KeyHandle, KeypairValue, PkiError, PkiResult};

/// Identifier of the native software backend
pub const SOFTWARE_BACKEND_ID: &str = "software";

pub trait Backend: Send + Sync {
    /// The identifier the registry indexes this backend's drivers with
    fn id(&self) -> &str;

    /// Credential used when a caller does not supply one
    fn default_credential(&self) -> Option<&Credential> {
        None
    }

    /// The engine context, for engine-class backends
    fn engine(&self) -> Option<&dyn KeyEngine> {
        None
    }

    /// The bulk delete capability, when the backend persists objects itself
    fn bulk_deleter(&self) -> Option<&dyn BulkDelete> {
        None
    }

    /// Release a key handle the backend attached to a keypair
    fn release_key_handle(&self, handle: KeyHandle) {
        debug!(
            "backend {}: released key handle {}",
            self.id(),
            handle.value()
        );
    }
}

impl Debug for dyn Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").field("id", &self.id()).finish()
    }
}

/// What an engine needs to unlock a key: the effective password
/// and a hint to display when prompting.
pub struct PasswordCallbackData {
    password: Option<Zeroizing<String>>,
    prompt_info: Option<String>,
}

impl PasswordCallbackData {
    #[must_use]
    pub fn new(password: Option<&str>, prompt_info: Option<&str>) -> Self {
        Self {
            password: password.map(|p| Zeroizing::new(p.to_owned())),
            prompt_info: prompt_info.map(ToOwned::to_owned),
        }
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }

    #[must_use]
    pub fn prompt_info(&self) -> Option<&str> {
        self.prompt_info.as_deref()
    }
}

/// A cryptographic engine able to materialize keys it holds.
/// Calls may block (password prompt, hardware round-trip).
pub trait KeyEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Load the private key designated by `key_id`
    fn load_private_key(
        &self,
        key_id: &str,
        callback_data: &PasswordCallbackData,
    ) -> PkiResult<KeypairValue>;

    /// Give back a handle the engine attached to a key it loaded
    fn release_handle(&self, handle: KeyHandle) {
        trace!(
            "engine {}: released key handle {}",
            self.name(),
            handle.value()
        );
    }

    /// Remove the key designated by `key_id` from the engine's storage
    fn delete_key(&self, key_id: &str) -> PkiResult<()> {
        Err(PkiError::NotSupported(format!(
            "engine {} cannot delete key {key_id}",
            self.name()
        )))
    }
}

/// Deletes the persisted copies of a collection of objects
pub trait BulkDelete: Send + Sync {
    fn delete_objects(&self, objects: &[&GenericObject]) -> PkiResult<()>;
}

/// The native software provider.
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    id: String,
}

impl SoftwareBackend {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self { id: id.to_owned() }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(SOFTWARE_BACKEND_ID)
    }
}

impl Backend for SoftwareBackend {
    fn id(&self) -> &str {
        &self.id
    }
}
