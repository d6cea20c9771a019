use openssl::{
    cms::CmsContentInfo,
    ocsp::{OcspRequest, OcspResponse},
    pkcs7::Pkcs7,
    pkcs12::Pkcs12,
};

use super::{duplicate_through_der, is_pem, release_native};
use crate::{
    DataField, ObjectDriver, ObjectKind, ObjectValue, ParsedData, PkiError, PkiResult, RawData,
    ValueDuplicate, ValueRelease,
};

type Decoder = fn(&[u8]) -> PkiResult<ObjectValue>;

/// Driver for container and protocol messages whose content is opaque to the
/// generic layer: they are created, duplicated and released through their encoding
/// but expose no fields.
pub(crate) struct EncodedDriver {
    kind: ObjectKind,
    decode: Decoder,
}

impl EncodedDriver {
    pub(crate) fn pkcs7() -> Self {
        Self {
            kind: ObjectKind::Pkcs7Message,
            decode: |encoded| {
                Ok(ObjectValue::Pkcs7(if is_pem(encoded) {
                    Pkcs7::from_pem(encoded)?
                } else {
                    Pkcs7::from_der(encoded)?
                }))
            },
        }
    }

    pub(crate) fn pkcs12() -> Self {
        Self {
            kind: ObjectKind::Pkcs12Container,
            decode: |encoded| Ok(ObjectValue::Pkcs12(Pkcs12::from_der(encoded)?)),
        }
    }

    pub(crate) fn ocsp_request() -> Self {
        Self {
            kind: ObjectKind::OcspRequest,
            decode: |encoded| Ok(ObjectValue::OcspRequest(OcspRequest::from_der(encoded)?)),
        }
    }

    pub(crate) fn ocsp_response() -> Self {
        Self {
            kind: ObjectKind::OcspResponse,
            decode: |encoded| Ok(ObjectValue::OcspResponse(OcspResponse::from_der(encoded)?)),
        }
    }

    pub(crate) fn cms() -> Self {
        Self {
            kind: ObjectKind::CmsMessage,
            decode: |encoded| {
                Ok(ObjectValue::Cms(if is_pem(encoded) {
                    CmsContentInfo::from_pem(encoded)?
                } else {
                    CmsContentInfo::from_der(encoded)?
                }))
            },
        }
    }

    fn check_kind(&self, value: &ObjectValue) -> PkiResult<()> {
        if value.kind() == self.kind {
            Ok(())
        } else {
            Err(PkiError::InvalidValue(format!(
                "expected a {}, found a {}",
                self.kind,
                value.kind()
            )))
        }
    }
}

impl ObjectDriver for EncodedDriver {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn create(&self, encoded: &[u8]) -> PkiResult<ObjectValue> {
        (self.decode)(encoded)
    }

    fn releaser(&self) -> Option<&dyn ValueRelease> {
        Some(self)
    }

    fn duplicator(&self) -> Option<&dyn ValueDuplicate> {
        Some(self)
    }

    fn raw_data(&self, value: &ObjectValue, _field: DataField) -> PkiResult<Option<RawData>> {
        self.check_kind(value)?;
        Ok(None)
    }

    fn parsed_data(
        &self,
        value: &ObjectValue,
        _field: DataField,
    ) -> PkiResult<Option<ParsedData>> {
        self.check_kind(value)?;
        Ok(None)
    }
}

impl ValueRelease for EncodedDriver {
    fn release(&self, value: ObjectValue) {
        release_native(value);
    }
}

impl ValueDuplicate for EncodedDriver {
    fn duplicate(&self, value: &ObjectValue) -> PkiResult<ObjectValue> {
        self.check_kind(value)?;
        duplicate_through_der(self, value)
    }
}
