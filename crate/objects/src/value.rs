use std::fmt::{self, Debug, Formatter};

use openssl::{
    cms::CmsContentInfo,
    ocsp::{OcspRequest, OcspResponse},
    pkcs7::Pkcs7,
    pkcs12::Pkcs12,
    pkey::{Id, PKey, Private},
    x509::{X509, X509Crl, X509Req},
};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{ObjectKind, PkiResult};

/// An opaque handle assigned by a backend to a key it holds.
/// The handle is wiped when dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct KeyHandle(u64);

impl KeyHandle {
    #[must_use]
    pub const fn new(handle: u64) -> Self {
        Self(handle)
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// A private key, together with the handles an HSM backend may have attached to it.
pub struct KeypairValue {
    key: PKey<Private>,
    private_handle: Option<KeyHandle>,
    public_handle: Option<KeyHandle>,
}

impl KeypairValue {
    #[must_use]
    pub fn new(key: PKey<Private>) -> Self {
        Self {
            key,
            private_handle: None,
            public_handle: None,
        }
    }

    #[must_use]
    pub fn with_handles(
        key: PKey<Private>,
        private_handle: Option<KeyHandle>,
        public_handle: Option<KeyHandle>,
    ) -> Self {
        Self {
            key,
            private_handle,
            public_handle,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &PKey<Private> {
        &self.key
    }

    #[must_use]
    pub fn is_rsa(&self) -> bool {
        self.key.id() == Id::RSA
    }

    #[must_use]
    pub const fn private_handle(&self) -> Option<&KeyHandle> {
        self.private_handle.as_ref()
    }

    #[must_use]
    pub const fn public_handle(&self) -> Option<&KeyHandle> {
        self.public_handle.as_ref()
    }

    pub(crate) fn take_private_handle(&mut self) -> Option<KeyHandle> {
        self.private_handle.take()
    }

    pub(crate) fn take_public_handle(&mut self) -> Option<KeyHandle> {
        self.public_handle.take()
    }
}

impl Debug for KeypairValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairValue")
            .field("key_id", &self.key.id())
            .field("bits", &self.key.bits())
            .field("private_handle", &self.private_handle)
            .field("public_handle", &self.public_handle)
            .finish()
    }
}

/// The payload held by a generic object, tagged by its kind.
pub enum ObjectValue {
    Keypair(KeypairValue),
    Certificate(X509),
    Crl(X509Crl),
    CertificateRequest(X509Req),
    Pkcs7(Pkcs7),
    Pkcs12(Pkcs12),
    OcspRequest(OcspRequest),
    OcspResponse(OcspResponse),
    Cms(CmsContentInfo),
    /// DER payload for kinds without a native representation
    Encoded {
        kind: ObjectKind,
        bytes: Zeroizing<Vec<u8>>,
    },
}

impl ObjectValue {
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Keypair(_) => ObjectKind::Keypair,
            Self::Certificate(_) => ObjectKind::Certificate,
            Self::Crl(_) => ObjectKind::Crl,
            Self::CertificateRequest(_) => ObjectKind::CertificateRequest,
            Self::Pkcs7(_) => ObjectKind::Pkcs7Message,
            Self::Pkcs12(_) => ObjectKind::Pkcs12Container,
            Self::OcspRequest(_) => ObjectKind::OcspRequest,
            Self::OcspResponse(_) => ObjectKind::OcspResponse,
            Self::Cms(_) => ObjectKind::CmsMessage,
            Self::Encoded { kind, .. } => *kind,
        }
    }

    /// DER encoding of the payload.
    /// Keypairs are encoded with their private part, hence the zeroizing buffer.
    pub fn to_der(&self) -> PkiResult<Zeroizing<Vec<u8>>> {
        let der = match self {
            Self::Keypair(keypair) => keypair.key().private_key_to_der()?,
            Self::Certificate(certificate) => certificate.to_der()?,
            Self::Crl(crl) => crl.to_der()?,
            Self::CertificateRequest(request) => request.to_der()?,
            Self::Pkcs7(pkcs7) => pkcs7.to_der()?,
            Self::Pkcs12(pkcs12) => pkcs12.to_der()?,
            Self::OcspRequest(request) => request.to_der()?,
            Self::OcspResponse(response) => response.to_der()?,
            Self::Cms(cms) => cms.to_der()?,
            Self::Encoded { bytes, .. } => bytes.to_vec(),
        };
        Ok(Zeroizing::new(der))
    }
}

impl Debug for ObjectValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keypair(keypair) => f.debug_tuple("Keypair").field(keypair).finish(),
            Self::Encoded { kind, bytes } => f
                .debug_struct("Encoded")
                .field("kind", kind)
                .field("len", &bytes.len())
                .finish(),
            other => write!(f, "{}", other.kind()),
        }
    }
}
