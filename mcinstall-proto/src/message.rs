//! Request shapes and well-known keys of the profile service.

use plist::{Dictionary, Value};
use serde::{Deserialize, Serialize};

/// Service identifier used when asking the device to start the profile service.
pub const SERVICE_NAME: &str = "com.apple.mobile.MCInstall";

/// `PayloadType` carried by every removal descriptor.
pub const PAYLOAD_TYPE_CONFIGURATION: &str = "Configuration";

/// Dictionary keys used on the wire.
pub mod keys {
    /// Discriminator of every request.
    pub const REQUEST_TYPE: &str = "RequestType";
    /// Raw profile bytes of an install request.
    pub const PAYLOAD: &str = "Payload";
    /// Binary-encoded removal descriptor of a remove request.
    pub const PROFILE_IDENTIFIER: &str = "ProfileIdentifier";
    /// Status envelope of every response.
    pub const STATUS: &str = "Status";
    /// Nested error records of a rejected request.
    pub const ERROR_CHAIN: &str = "ErrorChain";
    /// Human-readable text of one error record.
    pub const LOCALIZED_DESCRIPTION: &str = "LocalizedDescription";
    /// Device presentation order of installed profiles.
    pub const ORDERED_IDENTIFIERS: &str = "OrderedIdentifiers";
    /// Identifier to metadata mapping of installed profiles.
    pub const PROFILE_METADATA: &str = "ProfileMetadata";
    /// Display name inside a metadata record.
    pub const PAYLOAD_DISPLAY_NAME: &str = "PayloadDisplayName";
    /// UUID inside a metadata record.
    pub const PAYLOAD_UUID: &str = "PayloadUUID";
    /// Version inside a metadata record.
    pub const PAYLOAD_VERSION: &str = "PayloadVersion";
}

/// Values of the `Status` envelope.
pub mod status {
    /// The device accepted the request.
    pub const ACKNOWLEDGED: &str = "Acknowledged";
    /// The device rejected the request; an `ErrorChain` may follow.
    pub const ERROR: &str = "Error";
}

/// Request sent from host to the profile service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Request {
    /// Install a configuration profile.
    InstallProfile {
        /// Opaque profile bytes, forwarded untouched.
        payload: Vec<u8>,
    },
    /// Query installed profiles.
    GetProfileList,
    /// Remove an installed profile.
    RemoveProfile {
        /// A [`RemovalDescriptor`] in binary property-list form.
        descriptor: Vec<u8>,
    },
}

impl Request {
    /// Builds a remove request addressing the profile in `descriptor`.
    pub fn remove(descriptor: &RemovalDescriptor) -> Result<Self, plist::Error> {
        Ok(Self::RemoveProfile {
            descriptor: descriptor.to_binary()?,
        })
    }

    /// The `RequestType` string of this request.
    pub const fn request_type(&self) -> &'static str {
        match self {
            Self::InstallProfile { .. } => "InstallProfile",
            Self::GetProfileList => "GetProfileList",
            Self::RemoveProfile { .. } => "RemoveProfile",
        }
    }

    /// Converts the request into its wire dictionary.
    pub fn into_value(self) -> Value {
        let mut dict = Dictionary::new();
        dict.insert(
            keys::REQUEST_TYPE.into(),
            Value::String(self.request_type().into()),
        );
        match self {
            Self::InstallProfile { payload } => {
                dict.insert(keys::PAYLOAD.into(), Value::Data(payload));
            }
            Self::GetProfileList => {}
            Self::RemoveProfile { descriptor } => {
                dict.insert(keys::PROFILE_IDENTIFIER.into(), Value::Data(descriptor));
            }
        }
        Value::Dictionary(dict)
    }
}

/// Sub-document that addresses a profile for removal.
///
/// The device expects it binary-encoded inside the `ProfileIdentifier`
/// field rather than as plain request fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RemovalDescriptor {
    /// Always [`PAYLOAD_TYPE_CONFIGURATION`] for profiles built here.
    #[serde(rename = "PayloadType")]
    pub payload_type: String,
    /// Profile identifier (reverse-DNS style).
    #[serde(rename = "PayloadIdentifier")]
    pub identifier: String,
    /// Profile UUID.
    #[serde(rename = "PayloadUUID")]
    pub uuid: String,
    /// Profile version.
    #[serde(rename = "PayloadVersion")]
    pub version: u64,
}

impl RemovalDescriptor {
    /// Describes a configuration profile.
    pub fn configuration(
        identifier: impl Into<String>,
        uuid: impl Into<String>,
        version: u64,
    ) -> Self {
        Self {
            payload_type: PAYLOAD_TYPE_CONFIGURATION.into(),
            identifier: identifier.into(),
            uuid: uuid.into(),
            version,
        }
    }

    /// Encodes the descriptor as a binary property list.
    pub fn to_binary(&self) -> Result<Vec<u8>, plist::Error> {
        let mut buf = Vec::new();
        plist::to_writer_binary(&mut buf, self)?;
        Ok(buf)
    }

    /// Decodes a descriptor from a property list (binary or XML).
    pub fn from_binary(bytes: &[u8]) -> Result<Self, plist::Error> {
        plist::from_bytes(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn install_carries_payload_as_data() {
        let value = Request::InstallProfile {
            payload: b"<profile/>".to_vec(),
        }
        .into_value();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.get(keys::REQUEST_TYPE).unwrap().as_string(),
            Some("InstallProfile")
        );
        assert_eq!(
            dict.get(keys::PAYLOAD).unwrap().as_data(),
            Some(&b"<profile/>"[..])
        );
    }

    #[test]
    fn list_has_only_request_type() {
        let value = Request::GetProfileList.into_value();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(
            dict.get(keys::REQUEST_TYPE).unwrap().as_string(),
            Some("GetProfileList")
        );
    }

    #[test]
    fn remove_embeds_binary_descriptor() {
        let desc = RemovalDescriptor::configuration("com.example.wifi", "1234-ABCD", 3);
        let value = Request::remove(&desc).unwrap().into_value();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(
            dict.get(keys::REQUEST_TYPE).unwrap().as_string(),
            Some("RemoveProfile")
        );
        let bytes = dict.get(keys::PROFILE_IDENTIFIER).unwrap().as_data().unwrap();
        assert!(bytes.starts_with(b"bplist00"));

        let inner = Value::from_reader(std::io::Cursor::new(bytes)).unwrap();
        let inner = inner.as_dictionary().unwrap();
        assert_eq!(inner.get("PayloadType").unwrap().as_string(), Some("Configuration"));
        assert_eq!(
            inner.get("PayloadIdentifier").unwrap().as_string(),
            Some("com.example.wifi")
        );
        assert_eq!(inner.get("PayloadUUID").unwrap().as_string(), Some("1234-ABCD"));
        assert_eq!(
            inner.get("PayloadVersion").unwrap().as_unsigned_integer(),
            Some(3)
        );
    }

    #[test]
    fn descriptor_binary_roundtrip() {
        let desc = RemovalDescriptor::configuration(
            "com.example.vpn",
            "E621E1F8-C36C-495A-93FC-0C247A3E6E5F",
            u64::from(u32::MAX) + 7,
        );
        let back = RemovalDescriptor::from_binary(&desc.to_binary().unwrap()).unwrap();
        assert_eq!(back, desc);
    }
}
