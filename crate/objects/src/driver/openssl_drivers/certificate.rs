use openssl::{bn::BigNum, x509::X509};

use super::{duplicate_through_der, is_pem, owned_name, release_native, unix_time};
use crate::{
    DataField, DistinguishedName, ObjectDriver, ObjectKind, ObjectValue, ParsedData, PkiError,
    PkiResult, RawData, ValueDuplicate, ValueRelease,
};

pub(crate) struct CertificateDriver;

impl CertificateDriver {
    fn certificate(value: &ObjectValue) -> PkiResult<&X509> {
        match value {
            ObjectValue::Certificate(certificate) => Ok(certificate),
            other => Err(PkiError::InvalidValue(format!(
                "expected a certificate, found a {}",
                other.kind()
            ))),
        }
    }
}

impl ObjectDriver for CertificateDriver {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Certificate
    }

    fn create(&self, encoded: &[u8]) -> PkiResult<ObjectValue> {
        let certificate = if is_pem(encoded) {
            X509::from_pem(encoded)?
        } else {
            X509::from_der(encoded)?
        };
        Ok(ObjectValue::Certificate(certificate))
    }

    fn releaser(&self) -> Option<&dyn ValueRelease> {
        Some(self)
    }

    fn duplicator(&self) -> Option<&dyn ValueDuplicate> {
        Some(self)
    }

    fn raw_data(&self, value: &ObjectValue, field: DataField) -> PkiResult<Option<RawData>> {
        let certificate = Self::certificate(value)?;
        Ok(Some(match field {
            DataField::Version => RawData::Integer(BigNum::from_u32(u32::try_from(
                certificate.version(),
            )?)?),
            DataField::SerialNumber => RawData::Integer(certificate.serial_number().to_bn()?),
            DataField::Subject => RawData::Name(owned_name(certificate.subject_name())?),
            DataField::Issuer => RawData::Name(owned_name(certificate.issuer_name())?),
            DataField::NotBefore => RawData::Time(unix_time(certificate.not_before())?),
            DataField::NotAfter => RawData::Time(unix_time(certificate.not_after())?),
            DataField::PublicKey => RawData::Bytes(certificate.public_key()?.public_key_to_der()?),
            DataField::KeySize => RawData::Bits(certificate.public_key()?.bits()),
            DataField::Signature => RawData::Bytes(certificate.signature().as_slice().to_vec()),
            DataField::Algorithm => return Ok(None),
        }))
    }

    fn parsed_data(
        &self,
        value: &ObjectValue,
        field: DataField,
    ) -> PkiResult<Option<ParsedData>> {
        let certificate = Self::certificate(value)?;
        Ok(Some(match field {
            // the encoded version is zero based
            DataField::Version => ParsedData::Integer(i64::from(certificate.version()) + 1),
            DataField::SerialNumber => ParsedData::Text(
                certificate
                    .serial_number()
                    .to_bn()?
                    .to_hex_str()?
                    .to_string(),
            ),
            DataField::Subject => ParsedData::Name(DistinguishedName::from_x509_name(
                certificate.subject_name(),
            )?),
            DataField::Issuer => ParsedData::Name(DistinguishedName::from_x509_name(
                certificate.issuer_name(),
            )?),
            DataField::NotBefore => ParsedData::Text(certificate.not_before().to_string()),
            DataField::NotAfter => ParsedData::Text(certificate.not_after().to_string()),
            DataField::PublicKey => ParsedData::Text(
                String::from_utf8_lossy(&certificate.public_key()?.public_key_to_pem()?)
                    .into_owned(),
            ),
            DataField::KeySize => {
                ParsedData::Integer(i64::from(certificate.public_key()?.bits()))
            }
            DataField::Algorithm => {
                ParsedData::Text(certificate.signature_algorithm().object().to_string())
            }
            DataField::Signature => {
                ParsedData::Text(hex::encode(certificate.signature().as_slice()))
            }
        }))
    }
}

impl ValueRelease for CertificateDriver {
    fn release(&self, value: ObjectValue) {
        release_native(value);
    }
}

impl ValueDuplicate for CertificateDriver {
    fn duplicate(&self, value: &ObjectValue) -> PkiResult<ObjectValue> {
        duplicate_through_der(self, value)
    }
}

#[expect(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::CertificateDriver;
    use crate::{
        DataField, ObjectDriver, ParsedData, RawData, test_helpers::self_signed_certificate,
    };

    #[test]
    fn test_certificate_fields() {
        let (certificate, _key) = self_signed_certificate("C=US, O=Dis, CN=www.example.com");
        let driver = CertificateDriver;
        let value = driver.create(&certificate.to_pem().unwrap()).unwrap();

        let Some(ParsedData::Name(subject)) =
            driver.parsed_data(&value, DataField::Subject).unwrap()
        else {
            panic!("expected a subject name");
        };
        assert_eq!(subject.to_string(), "C=US, O=Dis, CN=www.example.com");

        assert_eq!(
            driver.parsed_data(&value, DataField::Version).unwrap(),
            Some(ParsedData::Integer(3))
        );
        assert_eq!(
            driver.parsed_data(&value, DataField::Algorithm).unwrap(),
            Some(ParsedData::Text("sha256WithRSAEncryption".to_owned()))
        );
        match driver.raw_data(&value, DataField::Signature).unwrap() {
            Some(RawData::Bytes(signature)) => assert_eq!(signature.len(), 256),
            _ => panic!("expected signature bytes"),
        }
        match (
            driver.raw_data(&value, DataField::NotBefore).unwrap(),
            driver.raw_data(&value, DataField::NotAfter).unwrap(),
        ) {
            (Some(RawData::Time(not_before)), Some(RawData::Time(not_after))) => {
                assert_eq!(not_after - not_before, 30 * 86_400);
            }
            _ => panic!("expected validity times"),
        }
    }

    #[test]
    fn test_certificate_print() {
        let (certificate, _key) = self_signed_certificate("CN=printer");
        let driver = CertificateDriver;
        let value = driver.create(&certificate.to_der().unwrap()).unwrap();
        let mut out = Vec::new();
        driver.print(&value, DataField::Issuer, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "CN=printer\n");
    }

    #[test]
    fn test_certificate_create_rejects_garbage() {
        CertificateDriver.create(b"not a certificate").unwrap_err();
    }
}
