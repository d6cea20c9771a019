use openssl::{bn::BigNum, x509::X509Req};
use x509_parser::{certification_request::X509CertificationRequest, prelude::FromDer};

use super::{duplicate_through_der, is_pem, owned_name, release_native};
use crate::{
    DataField, DistinguishedName, ObjectDriver, ObjectKind, ObjectValue, ParsedData, PkiError,
    PkiResult, RawData, ValueDuplicate, ValueRelease,
};

pub(crate) struct RequestDriver;

impl RequestDriver {
    fn request(value: &ObjectValue) -> PkiResult<&X509Req> {
        match value {
            ObjectValue::CertificateRequest(request) => Ok(request),
            other => Err(PkiError::InvalidValue(format!(
                "expected a certificate request, found a {}",
                other.kind()
            ))),
        }
    }

    /// The signature algorithm OID and the signature bits
    fn signature(request: &X509Req) -> PkiResult<(String, Vec<u8>)> {
        let der = request.to_der()?;
        let (_, parsed) = X509CertificationRequest::from_der(&der).map_err(|e| {
            PkiError::InvalidValue(format!("failed to parse the certificate request: {e}"))
        })?;
        Ok((
            parsed.signature_algorithm.algorithm.to_id_string(),
            parsed.signature_value.data.to_vec(),
        ))
    }
}

impl ObjectDriver for RequestDriver {
    fn kind(&self) -> ObjectKind {
        ObjectKind::CertificateRequest
    }

    fn create(&self, encoded: &[u8]) -> PkiResult<ObjectValue> {
        let request = if is_pem(encoded) {
            X509Req::from_pem(encoded)?
        } else {
            X509Req::from_der(encoded)?
        };
        Ok(ObjectValue::CertificateRequest(request))
    }

    fn releaser(&self) -> Option<&dyn ValueRelease> {
        Some(self)
    }

    fn duplicator(&self) -> Option<&dyn ValueDuplicate> {
        Some(self)
    }

    fn raw_data(&self, value: &ObjectValue, field: DataField) -> PkiResult<Option<RawData>> {
        let request = Self::request(value)?;
        Ok(match field {
            DataField::Version => Some(RawData::Integer(BigNum::from_u32(u32::try_from(
                request.version(),
            )?)?)),
            DataField::Subject => Some(RawData::Name(owned_name(request.subject_name())?)),
            DataField::PublicKey => Some(RawData::Bytes(request.public_key()?.public_key_to_der()?)),
            DataField::KeySize => Some(RawData::Bits(request.public_key()?.bits())),
            DataField::Signature => Some(RawData::Bytes(Self::signature(request)?.1)),
            _ => None,
        })
    }

    fn parsed_data(
        &self,
        value: &ObjectValue,
        field: DataField,
    ) -> PkiResult<Option<ParsedData>> {
        let request = Self::request(value)?;
        Ok(match field {
            DataField::Version => Some(ParsedData::Integer(i64::from(request.version()) + 1)),
            DataField::Subject => Some(ParsedData::Name(DistinguishedName::from_x509_name(
                request.subject_name(),
            )?)),
            DataField::PublicKey => Some(ParsedData::Text(
                String::from_utf8_lossy(&request.public_key()?.public_key_to_pem()?).into_owned(),
            )),
            DataField::KeySize => Some(ParsedData::Integer(i64::from(
                request.public_key()?.bits(),
            ))),
            DataField::Algorithm => Some(ParsedData::Text(Self::signature(request)?.0)),
            DataField::Signature => Some(ParsedData::Text(hex::encode(
                Self::signature(request)?.1,
            ))),
            _ => None,
        })
    }
}

impl ValueRelease for RequestDriver {
    fn release(&self, value: ObjectValue) {
        release_native(value);
    }
}

impl ValueDuplicate for RequestDriver {
    fn duplicate(&self, value: &ObjectValue) -> PkiResult<ObjectValue> {
        duplicate_through_der(self, value)
    }
}
