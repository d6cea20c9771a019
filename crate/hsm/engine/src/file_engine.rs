//! A key engine over a directory of private key files.

use std::{
    cell::Cell,
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use openssl::pkey::{Id, PKey, Private};
use pki_logger::{debug, trace, warn};
use pki_objects::{
    KeyEngine, KeyHandle, KeypairValue, PasswordCallbackData, PkiResult, is_pem, pki_error,
};
use zeroize::Zeroizing;

/// Loads PEM or DER private keys, possibly passphrase protected, from a key
/// directory. Relative key ids are resolved against that directory.
///
/// RSA keys are given a private and a public handle, the way a hardware module
/// attaches its object handles to the keys it exports. Handles stay open
/// until released through [`KeyEngine::release_handle`].
pub struct FileKeyEngine {
    root: PathBuf,
    next_handle: AtomicU64,
    open_handles: Mutex<HashSet<u64>>,
}

impl FileKeyEngine {
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            next_handle: AtomicU64::new(1),
            open_handles: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The number of handles given out and not yet released
    pub fn open_handles(&self) -> PkiResult<usize> {
        Ok(self.handles()?.len())
    }

    fn handles(&self) -> PkiResult<MutexGuard<'_, HashSet<u64>>> {
        self.open_handles
            .lock()
            .map_err(|_| pki_error!(Default, "Failed to acquire lock on key handles"))
    }

    fn new_handle(&self) -> PkiResult<KeyHandle> {
        let handle = self
            .next_handle
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| next.checked_add(1))
            .map_err(|_| {
                pki_error!(AllocationFailure, "no key handle left in {}", self.root.display())
            })?;
        self.handles()?.insert(handle);
        Ok(KeyHandle::new(handle))
    }

    fn key_path(&self, key_id: &str) -> PathBuf {
        let path = Path::new(key_id);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn parse_private_key(
    bytes: &[u8],
    callback_data: &PasswordCallbackData,
    path: &Path,
) -> PkiResult<PKey<Private>> {
    if is_pem(bytes) {
        let password_too_long = Cell::new(false);
        let parsed = PKey::private_key_from_pem_callback(bytes, |buffer| {
            debug!(
                "password requested for {}",
                callback_data.prompt_info().unwrap_or("a private key")
            );
            let password = callback_data.password().unwrap_or_default().as_bytes();
            if password.len() > buffer.len() {
                warn!(
                    "the password for {} exceeds the {} bytes OpenSSL accepts",
                    path.display(),
                    buffer.len()
                );
                password_too_long.set(true);
                return Ok(0);
            }
            buffer[..password.len()].copy_from_slice(password);
            Ok(password.len())
        });
        return parsed.map_err(|e| {
            if password_too_long.get() {
                pki_error!(
                    BackendOperationFailure,
                    "cannot load the private key {}: the password is longer than OpenSSL accepts",
                    path.display()
                )
            } else {
                pki_error!(
                    BackendOperationFailure,
                    "cannot load the private key {}: {e}",
                    path.display()
                )
            }
        });
    }
    match callback_data.password() {
        Some(password) => PKey::private_key_from_pkcs8_passphrase(bytes, password.as_bytes())
            .or_else(|_| PKey::private_key_from_der(bytes)),
        None => PKey::private_key_from_der(bytes),
    }
    .map_err(|e| {
        pki_error!(
            BackendOperationFailure,
            "cannot load the private key {}: {e}",
            path.display()
        )
    })
}

impl KeyEngine for FileKeyEngine {
    fn name(&self) -> &str {
        "file"
    }

    fn load_private_key(
        &self,
        key_id: &str,
        callback_data: &PasswordCallbackData,
    ) -> PkiResult<KeypairValue> {
        let path = self.key_path(key_id);
        trace!("loading the private key {}", path.display());
        let bytes = Zeroizing::new(fs::read(&path).map_err(|e| {
            pki_error!(BackendOperationFailure, "cannot read {}: {e}", path.display())
        })?);
        let key = parse_private_key(&bytes, callback_data, &path)?;
        if key.id() == Id::RSA {
            return Ok(KeypairValue::with_handles(
                key,
                Some(self.new_handle()?),
                Some(self.new_handle()?),
            ));
        }
        Ok(KeypairValue::new(key))
    }

    fn release_handle(&self, handle: KeyHandle) {
        match self.handles() {
            Ok(mut handles) => {
                if !handles.remove(&handle.value()) {
                    debug!("key handle {} was not open", handle.value());
                }
            }
            Err(e) => debug!("cannot release key handle {}: {e}", handle.value()),
        }
    }

    fn delete_key(&self, key_id: &str) -> PkiResult<()> {
        let path = self.key_path(key_id);
        debug!("deleting the private key {}", path.display());
        fs::remove_file(&path)?;
        Ok(())
    }
}
