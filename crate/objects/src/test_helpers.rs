use openssl::{
    asn1::{Asn1Integer, Asn1Time},
    bn::BigNum,
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{X509, X509Builder, X509Req, X509ReqBuilder},
};

use crate::DistinguishedName;

const NOT_BEFORE: i64 = 1_700_000_000;
const VALIDITY_DAYS: i64 = 30;

#[expect(clippy::unwrap_used)]
pub(crate) fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

/// A self-signed certificate valid for 30 days, subject and issuer set to `subject`
#[expect(clippy::unwrap_used)]
pub(crate) fn self_signed_certificate(subject: &str) -> (X509, PKey<Private>) {
    let key = rsa_key();
    let name = DistinguishedName::parse(subject)
        .unwrap()
        .to_x509_name()
        .unwrap();
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = Asn1Integer::from_bn(&BigNum::from_u32(42).unwrap()).unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::from_unix(NOT_BEFORE).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::from_unix(NOT_BEFORE + VALIDITY_DAYS * 86_400).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

#[expect(clippy::unwrap_used)]
pub(crate) fn certificate_request(subject: &str) -> X509Req {
    let key = rsa_key();
    let name = DistinguishedName::parse(subject)
        .unwrap()
        .to_x509_name()
        .unwrap();
    let mut builder = X509ReqBuilder::new().unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build()
}
