//! Registry configuration.
//!
//! ```toml
//! default_backend = "hsm"
//!
//! [[backends]]
//! type = "software"
//! id = "software"
//!
//! [[backends]]
//! type = "engine"
//! id = "hsm"
//! key_dir = "/etc/pki/keys"
//! credential = { password = "1234" }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use pki_logger::{debug, info};
use pki_objects::{
    Credential, DriverRegistry, PkiResult, PkiResultHelper, SOFTWARE_BACKEND_ID,
    SoftwareBackend, native_drivers,
};
use serde::Deserialize;

use crate::{EngineBackend, FileKeyEngine};

fn default_backend_id() -> String {
    SOFTWARE_BACKEND_ID.to_owned()
}

#[derive(Clone, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum BackendConfig {
    /// The native software provider
    Software { id: String },
    /// A file key engine
    Engine {
        id: String,
        /// Directory relative key ids are resolved against
        key_dir: PathBuf,
        /// Credential used when a caller does not supply one
        #[serde(default)]
        credential: Option<Credential>,
    },
}

impl BackendConfig {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Software { id } | Self::Engine { id, .. } => id,
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// The backend used when none is given
    #[serde(default = "default_backend_id")]
    pub default_backend: String,

    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend_id(),
            backends: Vec::new(),
        }
    }
}

impl RegistryConfig {
    pub fn from_toml(toml: &str) -> PkiResult<Self> {
        toml::from_str(toml).context("invalid registry configuration")
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PkiResult<Self> {
        let path = path.as_ref();
        debug!("loading the registry configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .with_context(|| format!("invalid registry configuration {}", path.display()))
    }

    /// Build the registry. The software backend is always registered,
    /// every backend gets the native drivers.
    pub fn build_registry(&self) -> PkiResult<DriverRegistry> {
        let mut builder = DriverRegistry::builder();
        if !self.backends.iter().any(|b| b.id() == SOFTWARE_BACKEND_ID) {
            builder =
                builder.register_backend(Arc::new(SoftwareBackend::default()), native_drivers());
        }
        for backend in &self.backends {
            builder = match backend {
                BackendConfig::Software { id } => builder.register_backend(
                    Arc::new(SoftwareBackend::new(id)),
                    native_drivers(),
                ),
                BackendConfig::Engine {
                    id,
                    key_dir,
                    credential,
                } => builder.register_backend(
                    Arc::new(EngineBackend::new(
                        id,
                        Arc::new(FileKeyEngine::new(key_dir)),
                        credential.clone(),
                    )),
                    native_drivers(),
                ),
            };
        }
        let registry = builder.default_backend(&self.default_backend).build()?;
        info!(
            "registry ready with {} backend(s), default backend: {}",
            self.backends.len(),
            self.default_backend
        );
        Ok(registry)
    }
}
