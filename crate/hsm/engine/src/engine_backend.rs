use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use pki_logger::debug;
use pki_objects::{
    Backend, BulkDelete, Credential, GenericObject, KeyEngine, KeyHandle, PkiError, PkiResult,
};

/// A backend whose keys live in a [`KeyEngine`].
pub struct EngineBackend {
    id: String,
    engine: Arc<dyn KeyEngine>,
    default_credential: Option<Credential>,
}

impl EngineBackend {
    #[must_use]
    pub fn new(
        id: &str,
        engine: Arc<dyn KeyEngine>,
        default_credential: Option<Credential>,
    ) -> Self {
        Self {
            id: id.to_owned(),
            engine,
            default_credential,
        }
    }
}

impl Backend for EngineBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn default_credential(&self) -> Option<&Credential> {
        self.default_credential.as_ref()
    }

    fn engine(&self) -> Option<&dyn KeyEngine> {
        Some(self.engine.as_ref())
    }

    fn bulk_deleter(&self) -> Option<&dyn BulkDelete> {
        Some(self)
    }

    fn release_key_handle(&self, handle: KeyHandle) {
        self.engine.release_handle(handle);
    }
}

impl BulkDelete for EngineBackend {
    /// Delete the keys designated by the origins of `objects`.
    /// Stops at the first object the engine cannot delete.
    fn delete_objects(&self, objects: &[&GenericObject]) -> PkiResult<()> {
        for object in objects {
            let origin = object.origin().ok_or(PkiError::NoOrigin)?;
            debug!(
                "backend {}: deleting {origin} from engine {}",
                self.id,
                self.engine.name()
            );
            self.engine.delete_key(&origin.address())?;
        }
        Ok(())
    }
}

impl Debug for EngineBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBackend")
            .field("id", &self.id)
            .field("engine", &self.engine.name())
            .field("default_credential", &self.default_credential)
            .finish()
    }
}
