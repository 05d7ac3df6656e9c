//! Profile values passed into and returned from client operations.

use std::collections::HashMap;

use mcinstall_proto::{Dictionary, RemovalDescriptor, Value, keys};
use serde::Serialize;

use crate::{Error, Result};

/// An opaque configuration profile payload.
///
/// The bytes are forwarded to the device untouched; signed and unsigned
/// `.mobileconfig` files are treated alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileBlob(Vec<u8>);

impl ProfileBlob {
    /// Wraps raw profile bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw profile bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Size of the payload in bytes.
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload holds no bytes.
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwraps the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for ProfileBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Identifier, UUID and version of an installed profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct ProfileIdentity {
    /// Profile identifier (reverse-DNS style).
    pub identifier: String,
    /// Profile UUID.
    pub uuid: String,
    /// Profile version; `0` is refused by [`ProfileClient::remove`](crate::ProfileClient::remove).
    pub version: u64,
}

impl ProfileIdentity {
    /// Creates an identity triple.
    pub fn new(identifier: impl Into<String>, uuid: impl Into<String>, version: u64) -> Self {
        Self {
            identifier: identifier.into(),
            uuid: uuid.into(),
            version,
        }
    }

    /// Rejects identities with an empty field or a zero version.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.identifier.is_empty() {
            return Err(Error::InvalidArgument("profile identifier is empty"));
        }
        if self.uuid.is_empty() {
            return Err(Error::InvalidArgument("profile UUID is empty"));
        }
        if self.version == 0 {
            return Err(Error::InvalidArgument("profile version is missing or zero"));
        }
        Ok(())
    }

    /// The removal sub-document addressing this profile.
    pub fn to_descriptor(&self) -> RemovalDescriptor {
        RemovalDescriptor::configuration(&*self.identifier, &*self.uuid, self.version)
    }
}

/// Metadata the device reports for one installed profile.
///
/// Fields the device omitted, or sent with an unexpected type, read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ProfileMetadata {
    /// `PayloadDisplayName`.
    pub display_name: Option<String>,
    /// `PayloadUUID`.
    pub uuid: Option<String>,
    /// `PayloadVersion`.
    pub version: Option<u64>,
}

impl ProfileMetadata {
    /// Reads a metadata record, tolerating missing or mistyped fields.
    fn from_record(record: &Dictionary) -> Self {
        let string = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_string)
                .map(str::to_owned)
        };
        Self {
            display_name: string(keys::PAYLOAD_DISPLAY_NAME),
            uuid: string(keys::PAYLOAD_UUID),
            version: record
                .get(keys::PAYLOAD_VERSION)
                .and_then(Value::as_unsigned_integer),
        }
    }
}

/// Installed profiles as reported by the device.
#[derive(Debug, Clone, Default)]
pub struct ProfileListing {
    /// Identifiers in device presentation order.
    order: Vec<String>,
    /// Metadata keyed by identifier.
    metadata: HashMap<String, ProfileMetadata>,
    /// Full response body without the `Status` envelope.
    body: Dictionary,
}

impl ProfileListing {
    /// Parses an acknowledged `GetProfileList` response body.
    ///
    /// Missing `OrderedIdentifiers` or `ProfileMetadata` mean no profiles
    /// are installed. Present but mistyped containers are malformed.
    pub fn from_body(body: Dictionary) -> Result<Self> {
        let order = match body.get(keys::ORDERED_IDENTIFIERS) {
            None => Vec::new(),
            Some(Value::Array(ids)) => ids
                .iter()
                .filter_map(Value::as_string)
                .map(str::to_owned)
                .collect(),
            Some(_) => {
                return Err(Error::MalformedResponse(
                    "OrderedIdentifiers is not an array".into(),
                ));
            }
        };

        let metadata = match body.get(keys::PROFILE_METADATA) {
            None => HashMap::new(),
            Some(Value::Dictionary(records)) => records
                .iter()
                .filter_map(|(id, record)| {
                    record
                        .as_dictionary()
                        .map(|r| (id.clone(), ProfileMetadata::from_record(r)))
                })
                .collect(),
            Some(_) => {
                return Err(Error::MalformedResponse(
                    "ProfileMetadata is not a dictionary".into(),
                ));
            }
        };

        Ok(Self {
            order,
            metadata,
            body,
        })
    }

    /// Identifiers in device presentation order.
    pub fn identifiers(&self) -> &[String] {
        &self.order
    }

    /// Metadata for `identifier`, if the device reported any.
    pub fn metadata(&self, identifier: &str) -> Option<&ProfileMetadata> {
        self.metadata.get(identifier)
    }

    /// Ordered `(identifier, metadata)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&ProfileMetadata>)> {
        self.order
            .iter()
            .map(|id| (id.as_str(), self.metadata.get(id)))
    }

    /// Builds the removal identity of a listed profile.
    ///
    /// Returns `None` if the profile is not listed or its UUID or version
    /// is unknown.
    pub fn identity(&self, identifier: &str) -> Option<ProfileIdentity> {
        if !self.order.iter().any(|id| id == identifier) {
            return None;
        }
        let meta = self.metadata.get(identifier)?;
        Some(ProfileIdentity::new(
            identifier,
            meta.uuid.clone()?,
            meta.version?,
        ))
    }

    /// Number of listed profiles.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no profiles are installed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The raw response body, without the `Status` envelope.
    pub const fn body(&self) -> &Dictionary {
        &self.body
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, uuid: &str, version: u64) -> Value {
        let mut dict = Dictionary::new();
        if let Some(name) = name {
            dict.insert(keys::PAYLOAD_DISPLAY_NAME.into(), Value::String(name.into()));
        }
        dict.insert(keys::PAYLOAD_UUID.into(), Value::String(uuid.into()));
        dict.insert(keys::PAYLOAD_VERSION.into(), Value::Integer(version.into()));
        Value::Dictionary(dict)
    }

    fn body(order: &[&str], records: Vec<(&str, Value)>) -> Dictionary {
        let mut meta = Dictionary::new();
        for (id, rec) in records {
            meta.insert(id.into(), rec);
        }
        let mut dict = Dictionary::new();
        dict.insert(
            keys::ORDERED_IDENTIFIERS.into(),
            Value::Array(order.iter().map(|s| Value::String((*s).into())).collect()),
        );
        dict.insert(keys::PROFILE_METADATA.into(), Value::Dictionary(meta));
        dict
    }

    #[test]
    fn empty_body_is_empty_listing() {
        let listing = ProfileListing::from_body(Dictionary::new()).unwrap();
        assert!(listing.is_empty());
        assert_eq!(listing.entries().count(), 0);
    }

    #[test]
    fn preserves_device_order() {
        let listing = ProfileListing::from_body(body(
            &["com.example.b", "com.example.a"],
            vec![
                ("com.example.a", record(Some("A"), "uuid-a", 1)),
                ("com.example.b", record(None, "uuid-b", 2)),
            ],
        ))
        .unwrap();

        assert_eq!(listing.identifiers(), ["com.example.b", "com.example.a"]);
        let entries: Vec<_> = listing.entries().collect();
        assert_eq!(entries[0].0, "com.example.b");
        assert_eq!(entries[0].1.unwrap().display_name, None);
        assert_eq!(entries[1].1.unwrap().display_name.as_deref(), Some("A"));
        assert_eq!(entries[1].1.unwrap().version, Some(1));
    }

    #[test]
    fn identifier_without_metadata_is_tolerated() {
        let listing = ProfileListing::from_body(body(
            &["com.example.orphan"],
            vec![("com.example.other", Value::String("junk".into()))],
        ))
        .unwrap();

        assert_eq!(listing.len(), 1);
        assert!(listing.metadata("com.example.orphan").is_none());
        assert!(listing.metadata("com.example.other").is_none());
        assert!(listing.identity("com.example.orphan").is_none());
    }

    #[test]
    fn mistyped_containers_are_malformed() {
        let mut dict = Dictionary::new();
        dict.insert(keys::ORDERED_IDENTIFIERS.into(), Value::String("x".into()));
        assert!(matches!(
            ProfileListing::from_body(dict),
            Err(Error::MalformedResponse(_))
        ));

        let mut dict = Dictionary::new();
        dict.insert(keys::PROFILE_METADATA.into(), Value::Array(vec![]));
        assert!(matches!(
            ProfileListing::from_body(dict),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn identity_from_listing() {
        let listing = ProfileListing::from_body(body(
            &["com.example.wifi"],
            vec![("com.example.wifi", record(Some("Wi-Fi"), "AB-CD", 4))],
        ))
        .unwrap();

        assert_eq!(
            listing.identity("com.example.wifi"),
            Some(ProfileIdentity::new("com.example.wifi", "AB-CD", 4))
        );
        assert_eq!(listing.identity("com.example.missing"), None);
    }

    #[test]
    fn identity_validation() {
        assert!(ProfileIdentity::new("id", "uuid", 1).validate().is_ok());
        for bad in [
            ProfileIdentity::new("", "uuid", 1),
            ProfileIdentity::new("id", "", 1),
            ProfileIdentity::new("id", "uuid", 0),
        ] {
            assert!(matches!(bad.validate(), Err(Error::InvalidArgument(_))));
        }
    }
}
