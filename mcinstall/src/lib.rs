//! Client for the on-device configuration-profile service.
//!
//! `mcinstall` installs, lists and removes configuration profiles on a
//! paired mobile device over a channel that is already connected to the
//! device's profile service. Device discovery, pairing and service start-up
//! are left to the caller.
//!
//! # Quick start
//!
//! ```no_run
//! use mcinstall::{FramedChannel, ProfileBlob, ProfileClient};
//!
//! let channel = FramedChannel::connect_tcp("127.0.0.1:62078")?;
//! let mut client = ProfileClient::bind(channel);
//!
//! let profile = ProfileBlob::new(std::fs::read("wifi.mobileconfig")?);
//! if let Err(e) = client.install(&profile) {
//!     for line in e.diagnostics() {
//!         eprintln!("{line}");
//!     }
//!     eprintln!("status code: 0x{:x}", client.last_status());
//! }
//!
//! for (id, meta) in client.list()?.entries() {
//!     println!("{id}: {:?}", meta.and_then(|m| m.display_name.as_deref()));
//! }
//! client.release()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod channel;
mod client;
mod error;
mod profile;
pub mod response;

pub use channel::{Channel, FramedChannel};
pub use client::ProfileClient;
pub use error::{Error, Result, STATUS_RELEASED, STATUS_SUCCESS, STATUS_UNKNOWN};
pub use mcinstall_proto::{SERVICE_NAME, Value};
pub use profile::{ProfileBlob, ProfileIdentity, ProfileListing, ProfileMetadata};
