//! Generic PKI objects.
//!
//! A [`GenericObject`] carries one value of an [`ObjectKind`] (keypair,
//! certificate, CRL, ...) bound to the [`ObjectDriver`] that knows how to
//! handle it and to the [`Backend`] that produced it. Drivers are looked up
//! per kind and backend in an immutable [`DriverRegistry`].

mod backend;
mod credential;
mod driver;
mod error;
mod kind;
mod locator;
mod name;
mod object;
mod registry;
mod value;

#[cfg(test)]
mod test_helpers;

pub use backend::{
    Backend, BulkDelete, KeyEngine, PasswordCallbackData, SOFTWARE_BACKEND_ID, SoftwareBackend,
};
pub use credential::Credential;
pub use driver::{
    ObjectDriver, ParsedData, RawData, ValueDuplicate, ValueRelease, is_pem, native_drivers,
};
pub use error::{
    PkiError,
    result::{PkiResult, PkiResultHelper},
};
pub use kind::{DataField, ObjectKind};
pub use locator::{Locator, LocatorScheme};
pub use name::{
    AttributeType, DistinguishedName, Rdn,
    tokenizer::{NameToken, ScanAction, ScanState, scan, tokenize, transition},
};
pub use object::GenericObject;
pub use registry::{DriverRegistry, RegistryBuilder};
pub use value::{KeyHandle, KeypairValue, ObjectValue};
