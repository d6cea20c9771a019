use openssl::{bn::BigNum, x509::X509Crl};
use x509_parser::{prelude::FromDer, revocation_list::CertificateRevocationList};

use super::{duplicate_through_der, is_pem, owned_name, release_native, unix_time};
use crate::{
    DataField, DistinguishedName, ObjectDriver, ObjectKind, ObjectValue, ParsedData, PkiError,
    PkiResult, RawData, ValueDuplicate, ValueRelease,
};

/// Fields the `openssl` crate does not expose on CRLs
struct CrlSignature {
    version: Option<u32>,
    algorithm: String,
    signature: Vec<u8>,
}

pub(crate) struct CrlDriver;

impl CrlDriver {
    fn crl(value: &ObjectValue) -> PkiResult<&X509Crl> {
        match value {
            ObjectValue::Crl(crl) => Ok(crl),
            other => Err(PkiError::InvalidValue(format!(
                "expected a CRL, found a {}",
                other.kind()
            ))),
        }
    }

    fn signature(crl: &X509Crl) -> PkiResult<CrlSignature> {
        let der = crl.to_der()?;
        let (_, parsed) = CertificateRevocationList::from_der(&der)
            .map_err(|e| PkiError::InvalidValue(format!("failed to parse the CRL: {e}")))?;
        Ok(CrlSignature {
            version: parsed.version().map(|v| v.0),
            algorithm: parsed.signature_algorithm.algorithm.to_id_string(),
            signature: parsed.signature_value.data.to_vec(),
        })
    }
}

impl ObjectDriver for CrlDriver {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Crl
    }

    fn create(&self, encoded: &[u8]) -> PkiResult<ObjectValue> {
        let crl = if is_pem(encoded) {
            X509Crl::from_pem(encoded)?
        } else {
            X509Crl::from_der(encoded)?
        };
        Ok(ObjectValue::Crl(crl))
    }

    fn releaser(&self) -> Option<&dyn ValueRelease> {
        Some(self)
    }

    fn duplicator(&self) -> Option<&dyn ValueDuplicate> {
        Some(self)
    }

    fn raw_data(&self, value: &ObjectValue, field: DataField) -> PkiResult<Option<RawData>> {
        let crl = Self::crl(value)?;
        Ok(match field {
            DataField::Version => Self::signature(crl)?
                .version
                .map(BigNum::from_u32)
                .transpose()?
                .map(RawData::Integer),
            DataField::Issuer => Some(RawData::Name(owned_name(crl.issuer_name())?)),
            DataField::NotBefore => Some(RawData::Time(unix_time(crl.last_update())?)),
            DataField::NotAfter => crl
                .next_update()
                .map(unix_time)
                .transpose()?
                .map(RawData::Time),
            DataField::Signature => Some(RawData::Bytes(Self::signature(crl)?.signature)),
            _ => None,
        })
    }

    fn parsed_data(
        &self,
        value: &ObjectValue,
        field: DataField,
    ) -> PkiResult<Option<ParsedData>> {
        let crl = Self::crl(value)?;
        Ok(match field {
            DataField::Version => Self::signature(crl)?
                .version
                .map(|v| ParsedData::Integer(i64::from(v) + 1)),
            DataField::Issuer => Some(ParsedData::Name(DistinguishedName::from_x509_name(
                crl.issuer_name(),
            )?)),
            DataField::NotBefore => Some(ParsedData::Text(crl.last_update().to_string())),
            DataField::NotAfter => crl
                .next_update()
                .map(|next_update| ParsedData::Text(next_update.to_string())),
            DataField::Algorithm => Some(ParsedData::Text(Self::signature(crl)?.algorithm)),
            DataField::Signature => Some(ParsedData::Text(hex::encode(
                Self::signature(crl)?.signature,
            ))),
            _ => None,
        })
    }
}

impl ValueRelease for CrlDriver {
    fn release(&self, value: ObjectValue) {
        release_native(value);
    }
}

impl ValueDuplicate for CrlDriver {
    fn duplicate(&self, value: &ObjectValue) -> PkiResult<ObjectValue> {
        duplicate_through_der(self, value)
    }
}
