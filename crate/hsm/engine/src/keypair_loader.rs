use std::sync::Arc;

use pki_logger::debug;
use pki_objects::{
    Backend, Credential, DriverRegistry, GenericObject, Locator, ObjectKind, ObjectValue,
    PasswordCallbackData, PkiError, PkiResult, pki_bail,
};

/// Load the private key designated by `locator` from the engine of `backend`.
///
/// The explicit `credential` takes priority over the backend's default one.
/// The keypair is returned as the single element of the list, with the
/// locator as its origin. Backends without an engine fail with
/// [`PkiError::NoDriver`] before anything is asked of an engine.
pub fn load_keypair(
    registry: &DriverRegistry,
    locator: &Locator,
    credential: Option<&Credential>,
    backend: &Arc<dyn Backend>,
) -> PkiResult<Vec<GenericObject>> {
    let Some(engine) = backend.engine() else {
        debug!("backend {} has no engine to load {locator}", backend.id());
        pki_bail!(NoDriver, "backend {} has no engine", backend.id());
    };

    let password = credential
        .and_then(Credential::password)
        .or_else(|| backend.default_credential().and_then(Credential::password));
    let address = locator.address();
    let callback_data = PasswordCallbackData::new(password, Some(&address));

    let mut object = registry.create(ObjectKind::Keypair, Some(backend.clone()))?;
    let keypair = engine
        .load_private_key(&address, &callback_data)
        .map_err(|e| {
            debug!("engine {} cannot load {locator}: {e}", engine.name());
            match e {
                PkiError::BackendOperationFailure(_) => e,
                other => PkiError::BackendOperationFailure(other.to_string()),
            }
        })?;
    object.set_value(ObjectValue::Keypair(keypair))?;
    object.set_origin(locator);
    object.set_credential(credential.cloned());
    debug!("loaded {locator} from engine {}", engine.name());
    Ok(vec![object])
}

/// Load the objects of `kind` designated by `locator`.
/// Only keypairs can be retrieved from an engine; other kinds give `None`.
pub fn load_objects(
    registry: &DriverRegistry,
    kind: ObjectKind,
    locator: &Locator,
    credential: Option<&Credential>,
    backend: &Arc<dyn Backend>,
) -> PkiResult<Option<Vec<GenericObject>>> {
    if kind != ObjectKind::Keypair {
        debug!(
            "backend {}: retrieving {kind} objects is not supported",
            backend.id()
        );
        return Ok(None);
    }
    load_keypair(registry, locator, credential, backend).map(Some)
}
