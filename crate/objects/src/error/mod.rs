//! Copyright 2024 Cosmian Tech SAS

use std::{num::TryFromIntError, str::Utf8Error};

use thiserror::Error;

use crate::ObjectKind;

pub(crate) mod result;

#[derive(Error, Debug)]
pub enum PkiError {
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    #[error("Backend operation failure: {0}")]
    BackendOperationFailure(String),

    #[error("{0}")]
    Default(String),

    #[error("Invalid attribute type: {0}")]
    InvalidAttributeType(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid locator: {0}")]
    Locator(String),

    #[error("Malformed name: {0}")]
    MalformedName(String),

    #[error("No callback: {0}")]
    NoCallback(String),

    #[error("No driver: {0}")]
    NoDriver(String),

    #[error("The object has no origin locator")]
    NoOrigin,

    #[error("Objects of kind {0} are not duplicable")]
    NotDuplicable(ObjectKind),

    #[error("Not Supported: {0}")]
    NotSupported(String),

    #[error("OpenSSL Error: {0}")]
    OpenSSL(String),
}

impl From<openssl::error::ErrorStack> for PkiError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSL(format!("Error: {e}. Details: {e:?}"))
    }
}

impl From<url::ParseError> for PkiError {
    fn from(e: url::ParseError) -> Self {
        Self::Locator(e.to_string())
    }
}

impl From<TryFromIntError> for PkiError {
    fn from(e: TryFromIntError) -> Self {
        Self::Default(e.to_string())
    }
}

impl From<Utf8Error> for PkiError {
    fn from(e: Utf8Error) -> Self {
        Self::Default(e.to_string())
    }
}

/// Build a [`PkiError`] variant carrying a formatted message.
///
/// `pki_error!(MalformedName, "no value for {type_text}")` is
/// `PkiError::MalformedName(format!("no value for {type_text}"))`.
#[macro_export]
macro_rules! pki_error {
    ($variant:ident, $($fmt:tt)+) => {
        $crate::PkiError::$variant(::std::format!($($fmt)+))
    };
}

/// Return early with a [`PkiError`] variant carrying a formatted message.
#[macro_export]
macro_rules! pki_bail {
    ($variant:ident, $($fmt:tt)+) => {
        return ::core::result::Result::Err($crate::pki_error!($variant, $($fmt)+))
    };
}

/// Return early with a [`PkiError`] variant when a condition does not hold.
#[macro_export]
macro_rules! pki_ensure {
    ($cond:expr, $variant:ident, $($fmt:tt)+) => {
        if !$cond {
            $crate::pki_bail!($variant, $($fmt)+);
        }
    };
}
