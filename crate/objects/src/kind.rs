use strum::{Display, EnumIter};

/// The kinds of objects the generic object layer can carry.
///
/// The set is closed for the native provider but backends may contribute
/// drivers for kinds the native provider does not model (PRQP messages,
/// cross-certificate pairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum ObjectKind {
    Unknown,
    Keypair,
    Certificate,
    Crl,
    CertificateRequest,
    Pkcs7Message,
    Pkcs12Container,
    OcspRequest,
    OcspResponse,
    PrqpRequest,
    PrqpResponse,
    CrossCertificatePair,
    CmsMessage,
}

impl ObjectKind {
    /// Human readable description of the kind
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Keypair => "Public KeyPair",
            Self::Certificate => "X509 Public Key Certificate",
            Self::Crl => "X509 CRL",
            Self::CertificateRequest => "PKCS#10 Certificate Request",
            Self::Pkcs7Message => "PKCS#7 Message",
            Self::Pkcs12Container => "PKCS#12 PMI Object",
            Self::OcspRequest => "OCSP Request",
            Self::OcspResponse => "OCSP Response",
            Self::PrqpRequest => "PRQP Request",
            Self::PrqpResponse => "PRQP Response",
            Self::CrossCertificatePair => "Cross Certificate Pair",
            Self::CmsMessage => "CMS Message",
        }
    }
}

/// The fields a driver may expose through the raw and parsed accessors.
/// A driver returns nothing for a field its kind does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DataField {
    Version,
    SerialNumber,
    Subject,
    Issuer,
    NotBefore,
    NotAfter,
    PublicKey,
    KeySize,
    Algorithm,
    Signature,
}
