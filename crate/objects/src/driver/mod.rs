//! Object drivers.
//!
//! A driver supplies, for one object kind and one backend, the operations the
//! generic object layer dispatches to. Releasing and duplicating values are
//! optional capabilities: a driver that does not offer them returns `None`
//! from [`ObjectDriver::releaser`] or [`ObjectDriver::duplicator`].

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::Write,
};

use openssl::{bn::BigNum, x509::X509Name};

use crate::{DataField, DistinguishedName, ObjectKind, ObjectValue, PkiResult};

pub(crate) mod openssl_drivers;

pub use openssl_drivers::{is_pem, native_drivers};

/// Raw, backend-level data extracted from a value
pub enum RawData {
    Bytes(Vec<u8>),
    Integer(BigNum),
    Name(X509Name),
    /// Seconds since the unix epoch
    Time(i64),
    Bits(u32),
}

impl Debug for RawData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&hex::encode(bytes)).finish(),
            Self::Integer(integer) => f.debug_tuple("Integer").field(integer).finish(),
            Self::Name(name) => f.debug_tuple("Name").field(&name.as_ref()).finish(),
            Self::Time(seconds) => f.debug_tuple("Time").field(seconds).finish(),
            Self::Bits(bits) => f.debug_tuple("Bits").field(bits).finish(),
        }
    }
}

/// Human-oriented data extracted from a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedData {
    Text(String),
    Integer(i64),
    Name(DistinguishedName),
}

impl Display for ParsedData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Integer(integer) => write!(f, "{integer}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Releases a value through the backend that allocated it.
pub trait ValueRelease: Send + Sync {
    fn release(&self, value: ObjectValue);
}

/// Deep-copies a value.
pub trait ValueDuplicate: Send + Sync {
    fn duplicate(&self, value: &ObjectValue) -> PkiResult<ObjectValue>;
}

pub trait ObjectDriver: Send + Sync {
    /// The kind of objects this driver handles
    fn kind(&self) -> ObjectKind;

    /// Allocate a value from its DER (or PEM) encoding
    fn create(&self, encoded: &[u8]) -> PkiResult<ObjectValue>;

    fn releaser(&self) -> Option<&dyn ValueRelease> {
        None
    }

    fn duplicator(&self) -> Option<&dyn ValueDuplicate> {
        None
    }

    /// Extract a field in its raw form.
    /// Returns `None` when the kind does not carry that field.
    fn raw_data(&self, value: &ObjectValue, field: DataField) -> PkiResult<Option<RawData>>;

    /// Extract a field in its parsed form.
    /// Returns `None` when the kind does not carry that field.
    fn parsed_data(&self, value: &ObjectValue, field: DataField)
    -> PkiResult<Option<ParsedData>>;

    /// Print the parsed form of a field
    fn print(&self, value: &ObjectValue, field: DataField, out: &mut dyn Write) -> PkiResult<()> {
        match self.parsed_data(value, field)? {
            Some(parsed) => writeln!(out, "{parsed}")?,
            None => writeln!(out, "{field}: n/a")?,
        }
        Ok(())
    }
}
