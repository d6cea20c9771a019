use openssl::pkey::{Id, PKey, Private};

use super::{duplicate_through_der, is_pem, release_native};
use crate::{
    DataField, KeypairValue, ObjectDriver, ObjectKind, ObjectValue, ParsedData, PkiError,
    PkiResult, RawData, ValueDuplicate, ValueRelease,
};

pub(crate) struct KeypairDriver;

impl KeypairDriver {
    fn key(value: &ObjectValue) -> PkiResult<&PKey<Private>> {
        match value {
            ObjectValue::Keypair(keypair) => Ok(keypair.key()),
            other => Err(PkiError::InvalidValue(format!(
                "expected a keypair, found a {}",
                other.kind()
            ))),
        }
    }
}

pub(crate) fn key_type_name(key: &PKey<Private>) -> &'static str {
    match key.id() {
        Id::RSA => "RSA",
        Id::DSA => "DSA",
        Id::DH => "DH",
        Id::EC => "EC",
        Id::ED25519 => "ED25519",
        Id::ED448 => "ED448",
        Id::X25519 => "X25519",
        Id::X448 => "X448",
        _ => "Unknown",
    }
}

impl ObjectDriver for KeypairDriver {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Keypair
    }

    fn create(&self, encoded: &[u8]) -> PkiResult<ObjectValue> {
        let key = if is_pem(encoded) {
            PKey::private_key_from_pem(encoded)?
        } else {
            PKey::private_key_from_der(encoded)?
        };
        Ok(ObjectValue::Keypair(KeypairValue::new(key)))
    }

    fn releaser(&self) -> Option<&dyn ValueRelease> {
        Some(self)
    }

    fn duplicator(&self) -> Option<&dyn ValueDuplicate> {
        Some(self)
    }

    fn raw_data(&self, value: &ObjectValue, field: DataField) -> PkiResult<Option<RawData>> {
        let key = Self::key(value)?;
        Ok(match field {
            DataField::PublicKey => Some(RawData::Bytes(key.public_key_to_der()?)),
            DataField::KeySize => Some(RawData::Bits(key.bits())),
            _ => None,
        })
    }

    fn parsed_data(
        &self,
        value: &ObjectValue,
        field: DataField,
    ) -> PkiResult<Option<ParsedData>> {
        let key = Self::key(value)?;
        Ok(match field {
            DataField::PublicKey => Some(ParsedData::Text(
                String::from_utf8_lossy(&key.public_key_to_pem()?).into_owned(),
            )),
            DataField::KeySize => Some(ParsedData::Integer(i64::from(key.bits()))),
            DataField::Algorithm => Some(ParsedData::Text(key_type_name(key).to_owned())),
            _ => None,
        })
    }
}

impl ValueRelease for KeypairDriver {
    fn release(&self, value: ObjectValue) {
        release_native(value);
    }
}

impl ValueDuplicate for KeypairDriver {
    fn duplicate(&self, value: &ObjectValue) -> PkiResult<ObjectValue> {
        duplicate_through_der(self, value)
    }
}
