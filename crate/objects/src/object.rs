//! The generic object: a kind-tagged value bound to the driver and backend
//! that produced it.

use std::{
    fmt::{self, Debug, Formatter},
    fs,
    io::Write,
    sync::Arc,
};

use pki_logger::{debug, trace};
use zeroize::Zeroizing;

use crate::{
    Backend, Credential, DataField, Locator, LocatorScheme, ObjectDriver, ObjectKind,
    ObjectValue, ParsedData, PkiError, PkiResult, RawData,
};

pub struct GenericObject {
    kind: ObjectKind,
    driver: Arc<dyn ObjectDriver>,
    backend: Arc<dyn Backend>,
    value: Option<ObjectValue>,
    origin: Option<Locator>,
    credential: Option<Credential>,
}

impl GenericObject {
    /// An empty object. Use the registry to create objects,
    /// it resolves the driver for the kind and backend.
    pub(crate) fn new(
        kind: ObjectKind,
        driver: Arc<dyn ObjectDriver>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            kind,
            driver,
            backend,
            value: None,
            origin: None,
            credential: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.kind.description()
    }

    #[must_use]
    pub fn driver(&self) -> &dyn ObjectDriver {
        self.driver.as_ref()
    }

    #[must_use]
    pub const fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Rebind the object to another backend.
    /// The driver is left untouched. Key handles the current backend issued
    /// for the value are handed back to it before the switch.
    pub fn set_backend(&mut self, backend: Arc<dyn Backend>) {
        if let Some(mut value) = self.value.take() {
            self.release_key_handles(&mut value);
            self.value = Some(value);
        }
        self.backend = backend;
    }

    #[must_use]
    pub const fn value(&self) -> Option<&ObjectValue> {
        self.value.as_ref()
    }

    /// Replace the value held by the object.
    ///
    /// The previous value, if any, is released through the driver first.
    /// When the driver cannot release values, the call fails with
    /// [`PkiError::NoCallback`] and the previous value is kept.
    pub fn set_value(&mut self, value: ObjectValue) -> PkiResult<()> {
        if value.kind() != self.kind {
            return Err(PkiError::InvalidValue(format!(
                "cannot store a {} value in a {} object",
                value.kind(),
                self.kind
            )));
        }
        if self.value.is_some() && self.driver.releaser().is_none() {
            debug!("no release callback for {}, keeping the current value", self.kind);
            return Err(PkiError::NoCallback(format!(
                "the {} driver cannot release the current value",
                self.kind
            )));
        }
        if let Some(previous) = self.value.take() {
            self.release_value(previous);
        }
        self.value = Some(value);
        Ok(())
    }

    /// Give up ownership of the value without releasing it.
    /// Backend key handles do not leave the object: they are released here.
    pub fn take_value(&mut self) -> Option<ObjectValue> {
        let mut value = self.value.take()?;
        self.release_key_handles(&mut value);
        Some(value)
    }

    /// A deep copy of the value through the driver
    pub fn duplicate_value(&self) -> PkiResult<Option<ObjectValue>> {
        let duplicator = self
            .driver
            .duplicator()
            .ok_or(PkiError::NotDuplicable(self.kind))?;
        self.value
            .as_ref()
            .map(|value| duplicator.duplicate(value))
            .transpose()
    }

    /// A new object of the same kind, driver and backend holding a deep copy
    /// of the value. The origin is not carried over.
    pub fn duplicate(&self) -> PkiResult<Self> {
        let value = self.duplicate_value()?;
        trace!("duplicated a {} object", self.kind);
        Ok(Self {
            kind: self.kind,
            driver: self.driver.clone(),
            backend: self.backend.clone(),
            value,
            origin: None,
            credential: self.credential.clone(),
        })
    }

    #[must_use]
    pub const fn origin(&self) -> Option<&Locator> {
        self.origin.as_ref()
    }

    pub fn set_origin(&mut self, origin: &Locator) {
        self.origin = Some(origin.clone());
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// The raw form of a field. `None` when the object is empty or the kind
    /// does not carry the field.
    pub fn raw_data(&self, field: DataField) -> PkiResult<Option<RawData>> {
        match &self.value {
            Some(value) => self.driver.raw_data(value, field),
            None => Ok(None),
        }
    }

    /// The parsed form of a field. `None` when the object is empty or the kind
    /// does not carry the field.
    pub fn parsed_data(&self, field: DataField) -> PkiResult<Option<ParsedData>> {
        match &self.value {
            Some(value) => self.driver.parsed_data(value, field),
            None => Ok(None),
        }
    }

    pub fn print_parsed(&self, field: DataField, out: &mut dyn Write) -> PkiResult<()> {
        let value = self.value.as_ref().ok_or_else(|| {
            PkiError::InvalidValue(format!("the {} object holds no value", self.kind))
        })?;
        self.driver.print(value, field, out)
    }

    /// Whether the object carries a signature
    pub fn is_signed(&self) -> PkiResult<bool> {
        Ok(self.raw_data(DataField::Signature)?.is_some())
    }

    pub fn to_der(&self) -> PkiResult<Zeroizing<Vec<u8>>> {
        self.value
            .as_ref()
            .ok_or_else(|| {
                PkiError::InvalidValue(format!("the {} object holds no value", self.kind))
            })?
            .to_der()
    }

    /// Delete the persisted copy of the object designated by its origin.
    ///
    /// Backends that persist objects themselves handle the deletion;
    /// otherwise only `file` origins can be deleted.
    pub fn delete_persisted(&self) -> PkiResult<()> {
        let origin = self.origin.as_ref().ok_or(PkiError::NoOrigin)?;
        if let Some(deleter) = self.backend.bulk_deleter() {
            debug!("deleting {origin} through backend {}", self.backend.id());
            return deleter.delete_objects(&[self]);
        }
        match (origin.scheme(), origin.file_path()) {
            (LocatorScheme::File, Some(path)) => {
                debug!("deleting {}", path.display());
                fs::remove_file(&path)?;
                Ok(())
            }
            _ => Err(PkiError::NotSupported(format!(
                "cannot delete {origin} without a backend able to do it"
            ))),
        }
    }

    /// Release the object and its value
    pub fn free(self) {
        drop(self);
    }

    fn release_key_handles(&self, value: &mut ObjectValue) {
        let ObjectValue::Keypair(keypair) = value else {
            return;
        };
        if keypair.is_rsa() {
            match keypair.take_private_handle() {
                Some(handle) => self.backend.release_key_handle(handle),
                None => debug!("no private key handle to release"),
            }
            match keypair.take_public_handle() {
                Some(handle) => self.backend.release_key_handle(handle),
                None => debug!("no public key handle to release"),
            }
        }
    }

    fn release_value(&self, mut value: ObjectValue) {
        self.release_key_handles(&mut value);
        match self.driver.releaser() {
            Some(releaser) => releaser.release(value),
            None => {
                trace!("no release callback for {}, dropping the value", self.kind);
                drop(value);
            }
        }
    }
}

impl Drop for GenericObject {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.release_value(value);
        }
    }
}

impl Debug for GenericObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericObject")
            .field("kind", &self.kind)
            .field("backend", &self.backend.id())
            .field("value", &self.value)
            .field("origin", &self.origin)
            .field("credential", &self.credential)
            .finish()
    }
}

#[expect(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use openssl::{pkey::PKey, rsa::Rsa};

    use crate::{
        Backend, DataField, DriverRegistry, KeyHandle, KeypairValue, Locator, ObjectKind,
        ObjectValue, PkiError, SoftwareBackend, driver::native_drivers,
        test_helpers::self_signed_certificate,
    };

    struct CountingBackend {
        released: AtomicUsize,
    }

    impl Backend for CountingBackend {
        fn id(&self) -> &str {
            "counting"
        }

        fn release_key_handle(&self, _handle: KeyHandle) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_set_value_checks_kind() {
        let registry = DriverRegistry::with_defaults().unwrap();
        let mut object = registry.create(ObjectKind::Certificate, None).unwrap();
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let result = object.set_value(ObjectValue::Keypair(KeypairValue::new(key)));
        assert!(matches!(result, Err(PkiError::InvalidValue(_))));
        assert!(object.value().is_none());
    }

    #[test]
    fn test_replace_and_duplicate_certificate() {
        let registry = DriverRegistry::with_defaults().unwrap();
        let (first, _) = self_signed_certificate("CN=first");
        let (second, _) = self_signed_certificate("CN=second");
        let mut object = registry
            .create_with_value(ObjectKind::Certificate, ObjectValue::Certificate(first), None)
            .unwrap();
        object
            .set_value(ObjectValue::Certificate(second.clone()))
            .unwrap();
        object.set_origin(&Locator::parse("file:///tmp/second.pem").unwrap());

        let copy = object.duplicate().unwrap();
        assert!(copy.origin().is_none());
        assert_eq!(*copy.to_der().unwrap(), second.to_der().unwrap());
        assert_eq!(
            copy.parsed_data(DataField::Subject)
                .unwrap()
                .unwrap()
                .to_string(),
            "CN=second"
        );
        assert!(copy.is_signed().unwrap());
    }

    #[test]
    fn test_empty_object_accessors() {
        let registry = DriverRegistry::with_defaults().unwrap();
        let object = registry.create(ObjectKind::Crl, None).unwrap();
        assert!(object.raw_data(DataField::Issuer).unwrap().is_none());
        assert!(object.parsed_data(DataField::Issuer).unwrap().is_none());
        assert!(!object.is_signed().unwrap());
        assert!(object.to_der().is_err());
        let mut out = Vec::new();
        assert!(object.print_parsed(DataField::Issuer, &mut out).is_err());
        assert!(matches!(object.delete_persisted(), Err(PkiError::NoOrigin)));
    }

    #[test]
    fn test_rsa_handles_are_released_through_the_backend() {
        let backend = Arc::new(CountingBackend {
            released: AtomicUsize::new(0),
        });
        let registry = DriverRegistry::builder()
            .register_backend(Arc::new(SoftwareBackend::default()), native_drivers())
            .register_backend(backend.clone(), native_drivers())
            .build()
            .unwrap();

        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let value = KeypairValue::with_handles(
            key.clone(),
            Some(KeyHandle::new(1)),
            Some(KeyHandle::new(2)),
        );
        let object = registry
            .create_with_value(
                ObjectKind::Keypair,
                ObjectValue::Keypair(value),
                Some(backend.clone()),
            )
            .unwrap();
        object.free();
        assert_eq!(backend.released.load(Ordering::SeqCst), 2);

        // only the private handle present
        let value = KeypairValue::with_handles(key, Some(KeyHandle::new(3)), None);
        let mut object = registry
            .create_with_value(
                ObjectKind::Keypair,
                ObjectValue::Keypair(value),
                Some(backend.clone()),
            )
            .unwrap();
        // replacing the value releases the previous one
        let other = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        object
            .set_value(ObjectValue::Keypair(KeypairValue::new(other)))
            .unwrap();
        assert_eq!(backend.released.load(Ordering::SeqCst), 3);
        drop(object);
        assert_eq!(backend.released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_handles_go_back_to_the_issuing_backend() {
        let backend = Arc::new(CountingBackend {
            released: AtomicUsize::new(0),
        });
        let registry = DriverRegistry::builder()
            .register_backend(Arc::new(SoftwareBackend::default()), native_drivers())
            .register_backend(backend.clone(), native_drivers())
            .build()
            .unwrap();
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let with_handles = |first: u64| {
            ObjectValue::Keypair(KeypairValue::with_handles(
                key.clone(),
                Some(KeyHandle::new(first)),
                Some(KeyHandle::new(first + 1)),
            ))
        };

        let mut object = registry
            .create_with_value(ObjectKind::Keypair, with_handles(1), Some(backend.clone()))
            .unwrap();
        object.set_backend(registry.default_backend().clone());
        assert_eq!(backend.released.load(Ordering::SeqCst), 2);
        assert_eq!(object.backend().id(), "software");
        drop(object);
        assert_eq!(backend.released.load(Ordering::SeqCst), 2);

        let mut object = registry
            .create_with_value(ObjectKind::Keypair, with_handles(3), Some(backend.clone()))
            .unwrap();
        let Some(ObjectValue::Keypair(taken)) = object.take_value() else {
            panic!("expected the keypair");
        };
        assert_eq!(backend.released.load(Ordering::SeqCst), 4);
        assert!(taken.private_handle().is_none());
        assert!(taken.public_handle().is_none());
        assert!(taken.key().public_eq(&key));
        assert!(object.value().is_none());
        drop(object);
        assert_eq!(backend.released.load(Ordering::SeqCst), 4);
    }
}
