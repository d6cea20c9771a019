use openssl::nid::Nid;
use strum::{EnumIter, IntoEnumIterator};

/// The attribute types a distinguished name is usually made of.
/// Anything else is carried as [`AttributeType::Unknown`] with its text preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum AttributeType {
    CommonName,
    Surname,
    SerialNumber,
    Country,
    Locality,
    StateOrProvince,
    Street,
    Organization,
    OrganizationalUnit,
    Title,
    GivenName,
    Initials,
    GenerationQualifier,
    DnQualifier,
    Pseudonym,
    EmailAddress,
    DomainComponent,
    UserId,
    Unknown,
}

impl AttributeType {
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::CommonName => "CN",
            Self::Surname => "SN",
            Self::SerialNumber => "serialNumber",
            Self::Country => "C",
            Self::Locality => "L",
            Self::StateOrProvince => "ST",
            Self::Street => "street",
            Self::Organization => "O",
            Self::OrganizationalUnit => "OU",
            Self::Title => "title",
            Self::GivenName => "GN",
            Self::Initials => "initials",
            Self::GenerationQualifier => "generationQualifier",
            Self::DnQualifier => "dnQualifier",
            Self::Pseudonym => "pseudonym",
            Self::EmailAddress => "emailAddress",
            Self::DomainComponent => "DC",
            Self::UserId => "UID",
            Self::Unknown => "UNKNOWN",
        }
    }

    #[must_use]
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::CommonName => "commonName",
            Self::Surname => "surname",
            Self::SerialNumber => "serialNumber",
            Self::Country => "countryName",
            Self::Locality => "localityName",
            Self::StateOrProvince => "stateOrProvinceName",
            Self::Street => "streetAddress",
            Self::Organization => "organizationName",
            Self::OrganizationalUnit => "organizationalUnitName",
            Self::Title => "title",
            Self::GivenName => "givenName",
            Self::Initials => "initials",
            Self::GenerationQualifier => "generationQualifier",
            Self::DnQualifier => "dnQualifier",
            Self::Pseudonym => "pseudonym",
            Self::EmailAddress => "emailAddress",
            Self::DomainComponent => "domainComponent",
            Self::UserId => "userId",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub const fn oid(self) -> Option<&'static str> {
        Some(match self {
            Self::CommonName => "2.5.4.3",
            Self::Surname => "2.5.4.4",
            Self::SerialNumber => "2.5.4.5",
            Self::Country => "2.5.4.6",
            Self::Locality => "2.5.4.7",
            Self::StateOrProvince => "2.5.4.8",
            Self::Street => "2.5.4.9",
            Self::Organization => "2.5.4.10",
            Self::OrganizationalUnit => "2.5.4.11",
            Self::Title => "2.5.4.12",
            Self::GivenName => "2.5.4.42",
            Self::Initials => "2.5.4.43",
            Self::GenerationQualifier => "2.5.4.44",
            Self::DnQualifier => "2.5.4.46",
            Self::Pseudonym => "2.5.4.65",
            Self::EmailAddress => "1.2.840.113549.1.9.1",
            Self::DomainComponent => "0.9.2342.19200300.100.1.25",
            Self::UserId => "0.9.2342.19200300.100.1.1",
            Self::Unknown => return None,
        })
    }

    #[must_use]
    pub const fn nid(self) -> Option<Nid> {
        Some(match self {
            Self::CommonName => Nid::COMMONNAME,
            Self::Surname => Nid::SURNAME,
            Self::SerialNumber => Nid::SERIALNUMBER,
            Self::Country => Nid::COUNTRYNAME,
            Self::Locality => Nid::LOCALITYNAME,
            Self::StateOrProvince => Nid::STATEORPROVINCENAME,
            Self::Street => Nid::STREETADDRESS,
            Self::Organization => Nid::ORGANIZATIONNAME,
            Self::OrganizationalUnit => Nid::ORGANIZATIONALUNITNAME,
            Self::Title => Nid::TITLE,
            Self::GivenName => Nid::GIVENNAME,
            Self::Initials => Nid::INITIALS,
            Self::GenerationQualifier => Nid::GENERATIONQUALIFIER,
            Self::DnQualifier => Nid::DNQUALIFIER,
            Self::Pseudonym => Nid::PSEUDONYM,
            Self::EmailAddress => Nid::PKCS9_EMAILADDRESS,
            Self::DomainComponent => Nid::DOMAINCOMPONENT,
            Self::UserId => Nid::USERID,
            Self::Unknown => return None,
        })
    }

    /// Resolve an attribute type from its short name, long name or dotted OID,
    /// ignoring case. `E` is accepted for `emailAddress`.
    #[must_use]
    pub fn resolve(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("E") {
            return Self::EmailAddress;
        }
        Self::iter()
            .filter(|t| *t != Self::Unknown)
            .find(|t| {
                t.short_name().eq_ignore_ascii_case(text)
                    || t.long_name().eq_ignore_ascii_case(text)
                    || t.oid() == Some(text)
            })
            .unwrap_or(Self::Unknown)
    }

    #[must_use]
    pub fn from_nid(nid: Nid) -> Self {
        Self::iter()
            .find(|t| t.nid() == Some(nid))
            .unwrap_or(Self::Unknown)
    }
}
