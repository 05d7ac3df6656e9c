//! Wire protocol for the on-device configuration-profile service.
//!
//! Messages are property lists framed with a 4-byte big-endian length
//! prefix, suitable for any reliable byte stream (forwarded TCP port,
//! Unix socket). Requests go out as XML; responses may come back as XML
//! or binary property lists.

mod codec;
mod message;

pub use codec::{MAX_FRAME, decode, encode};
pub use message::{
    PAYLOAD_TYPE_CONFIGURATION, RemovalDescriptor, Request, SERVICE_NAME, keys, status,
};
pub use plist::{Dictionary, Value};
