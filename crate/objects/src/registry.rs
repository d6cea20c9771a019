//! The driver registry.
//!
//! Populated once through [`RegistryBuilder`] and read-only afterwards, so a
//! registry can be shared between threads behind an `Arc`.

use std::{collections::HashMap, sync::Arc};

use pki_logger::{debug, trace};

use crate::{
    Backend, GenericObject, ObjectDriver, ObjectKind, ObjectValue, PkiError, PkiResult,
    SoftwareBackend, driver::native_drivers, pki_ensure, pki_error,
};

pub struct DriverRegistry {
    default_backend: Arc<dyn Backend>,
    backends: HashMap<String, Arc<dyn Backend>>,
    drivers: HashMap<(ObjectKind, String), Arc<dyn ObjectDriver>>,
}

impl DriverRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry holding only the native software backend and its drivers
    pub fn with_defaults() -> PkiResult<Self> {
        Self::builder()
            .register_backend(Arc::new(SoftwareBackend::default()), native_drivers())
            .build()
    }

    /// The backend used when none is supplied
    #[must_use]
    pub const fn default_backend(&self) -> &Arc<dyn Backend> {
        &self.default_backend
    }

    #[must_use]
    pub fn backend(&self, id: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.get(id)
    }

    pub fn backends(&self) -> impl Iterator<Item = &Arc<dyn Backend>> {
        self.backends.values()
    }

    /// Find the driver for a kind on a backend (the default backend when `None`)
    #[must_use]
    pub fn lookup(
        &self,
        kind: ObjectKind,
        backend: Option<&dyn Backend>,
    ) -> Option<Arc<dyn ObjectDriver>> {
        let backend_id = match backend {
            Some(backend) => backend.id(),
            None => self.default_backend.id(),
        };
        self.drivers.get(&(kind, backend_id.to_owned())).cloned()
    }

    fn resolve(
        &self,
        kind: ObjectKind,
        backend: Option<Arc<dyn Backend>>,
    ) -> PkiResult<(Arc<dyn ObjectDriver>, Arc<dyn Backend>)> {
        let backend = backend.unwrap_or_else(|| self.default_backend.clone());
        let driver = self.lookup(kind, Some(backend.as_ref())).ok_or_else(|| {
            debug!("no driver for {kind} on backend {}", backend.id());
            pki_error!(NoDriver, "no {kind} driver on backend {}", backend.id())
        })?;
        Ok((driver, backend))
    }

    /// Create an empty object of the given kind, bound to `backend`
    /// (or the default backend)
    pub fn create(
        &self,
        kind: ObjectKind,
        backend: Option<Arc<dyn Backend>>,
    ) -> PkiResult<GenericObject> {
        let (driver, backend) = self.resolve(kind, backend)?;
        trace!("creating a {kind} object on backend {}", backend.id());
        Ok(GenericObject::new(kind, driver, backend))
    }

    /// Create an object taking ownership of `value`
    pub fn create_with_value(
        &self,
        kind: ObjectKind,
        value: ObjectValue,
        backend: Option<Arc<dyn Backend>>,
    ) -> PkiResult<GenericObject> {
        let mut object = self.create(kind, backend)?;
        object.set_value(value).inspect_err(|e| {
            debug!("cannot set the value of a new {kind} object: {e}");
        })?;
        Ok(object)
    }

    /// Create an object holding a deep copy of `value`
    pub fn create_with_dup_value(
        &self,
        kind: ObjectKind,
        value: &ObjectValue,
        backend: Option<Arc<dyn Backend>>,
    ) -> PkiResult<GenericObject> {
        let mut object = self.create(kind, backend)?;
        let duplicator = object.driver().duplicator().ok_or_else(|| {
            debug!("no duplicate callback for {kind}");
            PkiError::NotDuplicable(kind)
        })?;
        let copy = duplicator.duplicate(value)?;
        object.set_value(copy)?;
        Ok(object)
    }

    /// Create an object from its DER or PEM encoding
    pub fn create_from_der(
        &self,
        kind: ObjectKind,
        encoded: &[u8],
        backend: Option<Arc<dyn Backend>>,
    ) -> PkiResult<GenericObject> {
        let mut object = self.create(kind, backend)?;
        let value = object.driver().create(encoded).inspect_err(|e| {
            debug!("cannot decode a {kind}: {e}");
        })?;
        object.set_value(value)?;
        Ok(object)
    }
}

/// Collects backends and their drivers before freezing them into a [`DriverRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    default_backend: Option<String>,
    backends: HashMap<String, Arc<dyn Backend>>,
    drivers: HashMap<(ObjectKind, String), Arc<dyn ObjectDriver>>,
    duplicate_ids: Vec<String>,
}

impl RegistryBuilder {
    /// Register a backend and the drivers it contributes.
    /// A later driver for the same kind replaces an earlier one.
    /// Registering a second backend under an id already taken makes
    /// [`RegistryBuilder::build`] fail.
    #[must_use]
    pub fn register_backend<I>(mut self, backend: Arc<dyn Backend>, drivers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ObjectDriver>>,
    {
        let id = backend.id().to_owned();
        if self.backends.contains_key(&id) {
            debug!("backend {id} is registered twice");
            self.duplicate_ids.push(id);
            return self;
        }
        for driver in drivers {
            trace!("registering the {} driver of backend {id}", driver.kind());
            self.drivers.insert((driver.kind(), id.clone()), driver);
        }
        self.backends.insert(id, backend);
        self
    }

    /// Select the default backend.
    /// Without this call, the native software backend is the default.
    #[must_use]
    pub fn default_backend(mut self, id: &str) -> Self {
        self.default_backend = Some(id.to_owned());
        self
    }

    pub fn build(mut self) -> PkiResult<DriverRegistry> {
        pki_ensure!(
            self.duplicate_ids.is_empty(),
            InvalidValue,
            "backend id(s) registered more than once: {}",
            self.duplicate_ids.join(", ")
        );
        let default_id = self
            .default_backend
            .take()
            .unwrap_or_else(|| crate::SOFTWARE_BACKEND_ID.to_owned());
        let default_backend = self.backends.get(&default_id).cloned().ok_or_else(|| {
            pki_error!(NoDriver, "the default backend {default_id} is not registered")
        })?;
        debug!(
            "driver registry built: {} backend(s), {} driver(s), default backend {default_id}",
            self.backends.len(),
            self.drivers.len()
        );
        Ok(DriverRegistry {
            default_backend,
            backends: self.backends,
            drivers: self.drivers,
        })
    }
}
