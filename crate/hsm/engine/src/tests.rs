#![expect(clippy::unwrap_used)]

use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use openssl::{
    pkey::{PKey, Private},
    rsa::Rsa,
    symm::Cipher,
};
use pki_logger::log_init;
use pki_objects::{
    Backend, Credential, DataField, DriverRegistry, KeyEngine, KeypairValue, Locator, ObjectKind,
    ParsedData, PasswordCallbackData, PkiError, PkiResult, SoftwareBackend, native_drivers,
};

use crate::{EngineBackend, FileKeyEngine, RegistryConfig, load_keypair, load_objects};

fn write_encrypted_key(dir: &Path, name: &str, password: &str) -> PKey<Private> {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    fs::write(
        dir.join(name),
        key.private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), password.as_bytes())
            .unwrap(),
    )
    .unwrap();
    key
}

fn engine_registry(
    engine: Arc<FileKeyEngine>,
    default_credential: Option<Credential>,
) -> (DriverRegistry, Arc<dyn Backend>) {
    let backend: Arc<dyn Backend> =
        Arc::new(EngineBackend::new("hsm", engine, default_credential));
    let registry = DriverRegistry::builder()
        .register_backend(Arc::new(SoftwareBackend::default()), native_drivers())
        .register_backend(backend.clone(), native_drivers())
        .build()
        .unwrap();
    (registry, backend)
}

/// Counts the keys it is asked to load, and fails every one of them
#[derive(Default)]
struct CountingEngine {
    calls: AtomicUsize,
}

impl KeyEngine for CountingEngine {
    fn name(&self) -> &str {
        "counting"
    }

    fn load_private_key(
        &self,
        key_id: &str,
        _callback_data: &PasswordCallbackData,
    ) -> PkiResult<KeypairValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PkiError::NotSupported(format!("cannot load {key_id}")))
    }
}

/// A backend whose engine context is not attached
struct DetachedBackend {
    engine: Arc<CountingEngine>,
}

impl Backend for DetachedBackend {
    fn id(&self) -> &str {
        "detached"
    }
}

#[test]
fn load_keypair_with_default_credential() {
    log_init(None);
    let dir = tempfile::tempdir().unwrap();
    let key = write_encrypted_key(dir.path(), "signing.pem", "1234");
    let engine = Arc::new(FileKeyEngine::new(dir.path()));
    let (registry, backend) =
        engine_registry(engine.clone(), Some(Credential::with_password("1234")));

    let locator = Locator::parse("id://signing.pem").unwrap();
    let mut objects = load_keypair(&registry, &locator, None, &backend).unwrap();
    assert_eq!(objects.len(), 1);
    let object = objects.remove(0);
    assert_eq!(object.kind(), ObjectKind::Keypair);
    assert_eq!(object.origin(), Some(&locator));
    assert_eq!(object.backend().id(), "hsm");
    assert_eq!(
        object.parsed_data(DataField::Algorithm).unwrap(),
        Some(ParsedData::Text("RSA".to_owned()))
    );
    assert_eq!(
        object.parsed_data(DataField::KeySize).unwrap(),
        Some(ParsedData::Integer(2048))
    );
    let der = object.to_der().unwrap();
    assert_eq!(*der, key.private_key_to_der().unwrap());

    // both RSA handles go back to the engine when the object is freed
    assert_eq!(engine.open_handles().unwrap(), 2);
    object.free();
    assert_eq!(engine.open_handles().unwrap(), 0);
}

#[test]
fn handles_return_to_the_engine_after_rebind_or_take() {
    log_init(None);
    let dir = tempfile::tempdir().unwrap();
    let key = write_encrypted_key(dir.path(), "rebind.pem", "1234");
    let engine = Arc::new(FileKeyEngine::new(dir.path()));
    let (registry, backend) =
        engine_registry(engine.clone(), Some(Credential::with_password("1234")));
    let locator = Locator::parse("id://rebind.pem").unwrap();

    let mut object = load_keypair(&registry, &locator, None, &backend)
        .unwrap()
        .remove(0);
    assert_eq!(engine.open_handles().unwrap(), 2);
    object.set_backend(registry.default_backend().clone());
    assert_eq!(engine.open_handles().unwrap(), 0);
    drop(object);
    assert_eq!(engine.open_handles().unwrap(), 0);

    let mut object = load_keypair(&registry, &locator, None, &backend)
        .unwrap()
        .remove(0);
    assert_eq!(engine.open_handles().unwrap(), 2);
    let taken = object.take_value().unwrap();
    assert_eq!(engine.open_handles().unwrap(), 0);
    assert_eq!(*taken.to_der().unwrap(), key.private_key_to_der().unwrap());
    drop(taken);
    drop(object);
    assert_eq!(engine.open_handles().unwrap(), 0);
}

#[test]
fn explicit_credential_wins_over_the_default() {
    log_init(None);
    let dir = tempfile::tempdir().unwrap();
    write_encrypted_key(dir.path(), "key.pem", "1234");
    let locator = Locator::from_path(dir.path().join("key.pem")).unwrap();

    let engine = Arc::new(FileKeyEngine::new(dir.path()));
    let (registry, backend) = engine_registry(engine, Some(Credential::with_password("0000")));
    assert!(matches!(
        load_keypair(&registry, &locator, None, &backend),
        Err(PkiError::BackendOperationFailure(_))
    ));
    let objects = load_keypair(
        &registry,
        &locator,
        Some(&Credential::with_password("1234")),
        &backend,
    )
    .unwrap();
    assert_eq!(
        objects[0].credential().and_then(Credential::password),
        Some("1234")
    );

    let engine = Arc::new(FileKeyEngine::new(dir.path()));
    let (registry, backend) = engine_registry(engine, Some(Credential::with_password("1234")));
    assert!(matches!(
        load_keypair(
            &registry,
            &locator,
            Some(&Credential::with_password("bad")),
            &backend
        ),
        Err(PkiError::BackendOperationFailure(_))
    ));
}

#[test]
fn backend_without_engine_fails_before_any_engine_call() {
    log_init(None);
    let engine = Arc::new(CountingEngine::default());
    let detached = Arc::new(DetachedBackend {
        engine: engine.clone(),
    });
    let detached_backend: Arc<dyn Backend> = detached.clone();
    let registry = DriverRegistry::builder()
        .register_backend(Arc::new(SoftwareBackend::default()), native_drivers())
        .register_backend(detached_backend.clone(), native_drivers())
        .build()
        .unwrap();
    let locator = Locator::parse("id://anything").unwrap();

    assert!(matches!(
        load_keypair(&registry, &locator, None, &detached_backend),
        Err(PkiError::NoDriver(_))
    ));
    assert!(matches!(
        load_keypair(&registry, &locator, None, registry.default_backend()),
        Err(PkiError::NoDriver(_))
    ));
    assert_eq!(detached.engine.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn engine_failures_are_backend_failures() {
    log_init(None);
    let engine = Arc::new(CountingEngine::default());
    let backend: Arc<dyn Backend> = Arc::new(EngineBackend::new("counting", engine.clone(), None));
    let registry = DriverRegistry::builder()
        .register_backend(Arc::new(SoftwareBackend::default()), native_drivers())
        .register_backend(backend.clone(), native_drivers())
        .build()
        .unwrap();
    let locator = Locator::parse("id://missing").unwrap();

    assert!(matches!(
        load_keypair(&registry, &locator, None, &backend),
        Err(PkiError::BackendOperationFailure(_))
    ));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

    // only keypairs can be retrieved
    assert!(
        load_objects(&registry, ObjectKind::Certificate, &locator, None, &backend)
            .unwrap()
            .is_none()
    );
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    assert!(load_objects(&registry, ObjectKind::Keypair, &locator, None, &backend).is_err());
    assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn delete_persisted_key_through_the_engine() {
    log_init(None);
    let dir = tempfile::tempdir().unwrap();
    write_encrypted_key(dir.path(), "old.pem", "1234");
    let engine = Arc::new(FileKeyEngine::new(dir.path()));
    let (registry, backend) = engine_registry(engine, None);

    let locator = Locator::parse("id://old.pem").unwrap();
    let objects = load_keypair(
        &registry,
        &locator,
        Some(&Credential::with_password("1234")),
        &backend,
    )
    .unwrap();
    objects[0].delete_persisted().unwrap();
    assert!(!dir.path().join("old.pem").exists());
    assert!(objects[0].value().is_some());
}

#[test]
fn registry_from_configuration_file() {
    log_init(None);
    let dir = tempfile::tempdir().unwrap();
    write_encrypted_key(dir.path(), "ca.pem", "secret");
    let config_path = dir.path().join("registry.toml");
    fs::write(
        &config_path,
        format!(
            r#"
default_backend = "hsm"

[[backends]]
type = "software"
id = "software"

[[backends]]
type = "engine"
id = "hsm"
key_dir = '{}'
credential = {{ password = "secret" }}
"#,
            dir.path().display()
        ),
    )
    .unwrap();

    let registry = RegistryConfig::load_from_file(&config_path)
        .unwrap()
        .build_registry()
        .unwrap();
    let backend = registry.default_backend().clone();
    let objects = load_keypair(
        &registry,
        &Locator::parse("id://ca.pem").unwrap(),
        None,
        &backend,
    )
    .unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].kind(), ObjectKind::Keypair);
    assert!(!objects[0].is_signed().unwrap());
}
