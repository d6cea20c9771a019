//! Distinguished names.
//!
//! A [`DistinguishedName`] is an ordered sequence of [`Rdn`] records built
//! from text by the tokenizer, or read from an OpenSSL `X509Name`.

use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use openssl::{
    asn1::Asn1Object,
    hash::{MessageDigest, hash},
    x509::{X509Name, X509NameBuilder, X509NameRef},
};
use pki_logger::debug;
use x509_parser::{
    asn1_rs::Tag,
    prelude::FromDer,
    x509::{AttributeTypeAndValue, X509Name as DerName},
};

use crate::{PkiError, PkiResult, pki_bail, pki_error};

mod attribute;
pub mod tokenizer;

pub use attribute::AttributeType;
use tokenizer::{NameToken, scan, tokenize};

/// One typed attribute of a name.
/// `multivalued` marks an attribute joined to the previous one with `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    attribute_type: AttributeType,
    type_text: String,
    value: String,
    multivalued: bool,
}

impl Rdn {
    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// The short name of a well-known type, the text as written otherwise
    #[must_use]
    pub fn type_text(&self) -> &str {
        &self.type_text
    }

    #[must_use]
    pub fn type_description(&self) -> &str {
        match self.attribute_type {
            AttributeType::Unknown => &self.type_text,
            known => known.long_name(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn is_multivalued(&self) -> bool {
        self.multivalued
    }

    fn build(type_text: &str, value: &str, multivalued: bool, first: bool) -> PkiResult<Self> {
        let type_text = type_text.trim();
        let value = value.trim();
        if value.is_empty() {
            pki_bail!(MalformedName, "attribute {type_text} has no value");
        }
        let attribute_type = AttributeType::resolve(type_text);
        let type_text = match attribute_type {
            AttributeType::Unknown => {
                Asn1Object::from_str(type_text).map_err(|e| {
                    debug!("unknown attribute type {type_text:?}: {e}");
                    PkiError::InvalidAttributeType(type_text.to_owned())
                })?;
                type_text.to_owned()
            }
            known => known.short_name().to_owned(),
        };
        let multivalued = if multivalued && first {
            debug!("the first attribute of a name cannot join a previous one");
            false
        } else {
            multivalued
        };
        Ok(Self {
            attribute_type,
            type_text,
            value: value.to_owned(),
            multivalued,
        })
    }

    fn canonical(&self) -> (String, String, bool) {
        (
            self.type_text.to_lowercase(),
            self.value
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
            self.multivalued,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct DistinguishedName {
    entries: Vec<Rdn>,
}

impl DistinguishedName {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a name from its text form, e.g. `C=US, O=Dis, CN=www.example.com`
    pub fn parse(text: &str) -> PkiResult<Self> {
        let mut name = Self::new();
        name.add(text)?;
        Ok(name)
    }

    /// Append the attributes of `text`: `type=value`, or `+type=value`
    /// to join the previous RDN.
    /// Either every attribute is appended or, on error, none is.
    pub fn add(&mut self, text: &str) -> PkiResult<()> {
        let mut pending: Vec<Rdn> = Vec::new();
        scan(text, |token: NameToken| {
            let first = self.entries.is_empty() && pending.is_empty();
            pending.push(Rdn::build(
                &token.type_text,
                &token.value,
                token.multivalued,
                first,
            )?);
            Ok(())
        })?;
        self.entries.extend(pending);
        Ok(())
    }

    /// Append one attribute.
    ///
    /// The type must be a well-known attribute, or a name or dotted OID
    /// OpenSSL knows. An empty value is a malformed name.
    pub fn add_entry(
        &mut self,
        type_text: &str,
        value: &str,
        multivalued: bool,
    ) -> PkiResult<()> {
        let rdn = Rdn::build(type_text, value, multivalued, self.entries.is_empty())?;
        self.entries.push(rdn);
        Ok(())
    }

    #[must_use]
    pub fn entries(&self) -> &[Rdn] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Order names on their canonical form: types and values compared
    /// case-insensitively, runs of whitespace in values collapsed.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.entries
            .iter()
            .map(Rdn::canonical)
            .cmp(other.entries.iter().map(Rdn::canonical))
    }

    /// The attributes of the name, re-read from its text form.
    /// With a filter, only the attributes of that type are returned.
    pub fn get_list(&self, filter: Option<AttributeType>) -> PkiResult<Vec<Rdn>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut list = Vec::new();
        for token in tokenize(&self.to_string())? {
            let attribute_type = AttributeType::resolve(&token.type_text);
            if filter.is_some_and(|f| f != attribute_type) {
                continue;
            }
            list.push(Rdn {
                attribute_type,
                type_text: token.type_text,
                value: token.value,
                multivalued: token.multivalued,
            });
        }
        Ok(list)
    }

    /// The OpenSSL form of the name.
    /// Multivalued RDNs are flattened into consecutive entries: the `openssl`
    /// builder only appends entries to new sets.
    pub fn to_x509_name(&self) -> PkiResult<X509Name> {
        let mut builder = X509NameBuilder::new()?;
        for rdn in &self.entries {
            match rdn.attribute_type.nid() {
                Some(nid) => builder.append_entry_by_nid(nid, &rdn.value)?,
                None => builder.append_entry_by_text(&rdn.type_text, &rdn.value)?,
            }
        }
        Ok(builder.build())
    }

    /// Read an OpenSSL name. The RDN sets of the encoding are kept: the
    /// second and later members of a set are multivalued.
    pub fn from_x509_name(name: &X509NameRef) -> PkiResult<Self> {
        let der = name.to_der()?;
        let (_, parsed) = DerName::from_der(&der)
            .map_err(|e| pki_error!(InvalidValue, "cannot decode the name: {e}"))?;
        let mut dn = Self::new();
        for set in parsed.iter() {
            for (position, attribute) in set.iter().enumerate() {
                let oid = attribute.attr_type().to_id_string();
                let type_text = match AttributeType::resolve(&oid) {
                    AttributeType::Unknown => Asn1Object::from_str(&oid)?.to_string(),
                    known => known.short_name().to_owned(),
                };
                dn.add_entry(&type_text, &attribute_text(attribute)?, position > 0)?;
            }
        }
        Ok(dn)
    }

    /// Digest of the DER encoding of the name
    pub fn digest(&self, md: MessageDigest) -> PkiResult<Vec<u8>> {
        let der = self.to_x509_name()?.to_der()?;
        Ok(hash(md, &der)?.to_vec())
    }
}

/// The text of an attribute value, whatever ASN.1 string type carries it
fn attribute_text(attribute: &AttributeTypeAndValue<'_>) -> PkiResult<String> {
    let data = attribute.as_slice();
    match attribute.attr_value().tag() {
        Tag::BmpString => {
            if data.len() % 2 != 0 {
                pki_bail!(InvalidValue, "odd BMPString length {}", data.len());
            }
            char::decode_utf16(data.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])))
                .collect::<Result<String, _>>()
                .map_err(|e| pki_error!(InvalidValue, "invalid BMPString: {e}"))
        }
        Tag::UniversalString => data
            .chunks(4)
            .map(|c| {
                <[u8; 4]>::try_from(c)
                    .ok()
                    .and_then(|bytes| char::from_u32(u32::from_be_bytes(bytes)))
                    .ok_or_else(|| pki_error!(InvalidValue, "invalid UniversalString"))
            })
            .collect(),
        // single byte sets, read as latin-1
        Tag::TeletexString | Tag::VisibleString => {
            Ok(data.iter().copied().map(char::from).collect())
        }
        _ => attribute
            .as_str()
            .map(ToOwned::to_owned)
            .map_err(|e| pki_error!(InvalidValue, "unsupported attribute value: {e}")),
    }
}

fn escape(text: &str, specials: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || specials.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const VALUE_SPECIALS: &[char] = &[',', '+', '/', ';'];
const TYPE_SPECIALS: &[char] = &[',', '+', '/', ';', '='];

impl Display for DistinguishedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(if rdn.multivalued { "+" } else { ", " })?;
            }
            write!(
                f,
                "{}={}",
                escape(&rdn.type_text, TYPE_SPECIALS),
                escape(&rdn.value, VALUE_SPECIALS)
            )?;
        }
        Ok(())
    }
}

impl FromStr for DistinguishedName {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for DistinguishedName {}
