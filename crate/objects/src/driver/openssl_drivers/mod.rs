//! Drivers backed by the native OpenSSL provider.

use std::sync::Arc;

use openssl::{
    asn1::{Asn1Time, Asn1TimeRef},
    x509::{X509Name, X509NameRef},
};
use pki_logger::trace;

use crate::{ObjectDriver, ObjectValue, PkiResult};

mod certificate;
mod crl;
mod encoded;
mod keypair;
mod request;

pub(crate) use certificate::CertificateDriver;
pub(crate) use crl::CrlDriver;
pub(crate) use encoded::EncodedDriver;
pub(crate) use keypair::KeypairDriver;
pub(crate) use request::RequestDriver;

/// The drivers the native provider contributes, one per kind it can represent.
#[must_use]
pub fn native_drivers() -> Vec<Arc<dyn ObjectDriver>> {
    vec![
        Arc::new(KeypairDriver),
        Arc::new(CertificateDriver),
        Arc::new(CrlDriver),
        Arc::new(RequestDriver),
        Arc::new(EncodedDriver::pkcs7()),
        Arc::new(EncodedDriver::pkcs12()),
        Arc::new(EncodedDriver::ocsp_request()),
        Arc::new(EncodedDriver::ocsp_response()),
        Arc::new(EncodedDriver::cms()),
    ]
}

/// Whether `encoded` is PEM text rather than DER, leading whitespace aside
#[must_use]
pub fn is_pem(encoded: &[u8]) -> bool {
    encoded
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| encoded[start..].starts_with(b"-----BEGIN"))
}

/// Seconds elapsed since the unix epoch
pub(crate) fn unix_time(time: &Asn1TimeRef) -> PkiResult<i64> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    Ok(i64::from(diff.days) * 86_400 + i64::from(diff.secs))
}

pub(crate) fn owned_name(name: &X509NameRef) -> PkiResult<X509Name> {
    Ok(X509Name::from_der(&name.to_der()?)?)
}

/// Deep copy through the DER encoding: the copy shares nothing with the source.
pub(crate) fn duplicate_through_der(
    driver: &dyn ObjectDriver,
    value: &ObjectValue,
) -> PkiResult<ObjectValue> {
    trace!("duplicating a {} value", value.kind());
    driver.create(&value.to_der()?)
}

pub(crate) fn release_native(value: ObjectValue) {
    trace!("releasing a {} value", value.kind());
    drop(value);
}
