//! Engine-class backends.
//!
//! An [`EngineBackend`] fronts a [`KeyEngine`](pki_objects::KeyEngine) able to
//! materialize private keys it holds. [`load_keypair`] asks the engine for a
//! key designated by a locator and wraps it in a generic keypair object.

mod config;
mod engine_backend;
mod file_engine;
mod keypair_loader;

pub use config::{BackendConfig, RegistryConfig};
pub use engine_backend::EngineBackend;
pub use file_engine::FileKeyEngine;
pub use keypair_loader::{load_keypair, load_objects};

#[cfg(test)]
mod tests;
