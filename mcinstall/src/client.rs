//! Host-side client for the on-device configuration-profile service.
//!
//! Each operation is one blocking request/response cycle on the bound
//! [`Channel`]. There is no pipelining and no retry: a channel failure ends
//! the operation immediately.

use mcinstall_proto::{Dictionary, Request};
use tracing::{debug, trace};

use crate::channel::Channel;
use crate::error::{STATUS_RELEASED, STATUS_SUCCESS, STATUS_UNKNOWN};
use crate::profile::{ProfileBlob, ProfileIdentity, ProfileListing};
use crate::response;
use crate::{Error, Result};

/// A client bound to one profile service channel.
///
/// The client owns its channel exclusively; dropping the client, or calling
/// [`release`](Self::release), releases it. Operations take `&mut self`, so
/// a client serves one caller at a time.
#[derive(Debug)]
pub struct ProfileClient<C: Channel> {
    /// The bound channel, `None` once released.
    channel: Option<C>,
    /// Status code of the most recent operation.
    last_status: i32,
}

impl<C: Channel> ProfileClient<C> {
    /// Binds a client to a channel that is already connected to the service.
    pub fn bind(channel: C) -> Self {
        Self {
            channel: Some(channel),
            last_status: STATUS_UNKNOWN,
        }
    }

    /// Installs a configuration profile.
    ///
    /// The payload is forwarded as-is, including an empty one.
    pub fn install(&mut self, profile: &ProfileBlob) -> Result<()> {
        self.ensure_bound()?;
        self.request(Request::InstallProfile {
            payload: profile.as_bytes().to_vec(),
        })
        .map(drop)
    }

    /// Lists installed profiles.
    ///
    /// A device with no profiles yields an empty listing. An acknowledged
    /// reply whose `OrderedIdentifiers` or `ProfileMetadata` has the wrong
    /// type still fails with [`Error::MalformedResponse`], and
    /// [`last_status`](Self::last_status) then reads that error's code.
    pub fn list(&mut self) -> Result<ProfileListing> {
        self.ensure_bound()?;
        let body = self.request(Request::GetProfileList)?;
        ProfileListing::from_body(body).inspect_err(|e| self.last_status = e.code())
    }

    /// Removes an installed profile.
    ///
    /// Identities with an empty identifier or UUID, or a zero version, are
    /// refused before anything is sent.
    pub fn remove(&mut self, identity: &ProfileIdentity) -> Result<()> {
        self.ensure_bound()?;
        identity.validate()?;
        let request = Request::remove(&identity.to_descriptor())
            .map_err(|e| Error::Unknown(std::io::Error::other(e)))?;
        self.request(request).map(drop)
    }

    /// Status code recorded by the most recent operation.
    ///
    /// Reads [`STATUS_UNKNOWN`] before the first classified response and
    /// after a channel failure, and [`STATUS_RELEASED`] once released.
    pub const fn last_status(&self) -> i32 {
        if self.channel.is_some() {
            self.last_status
        } else {
            STATUS_RELEASED
        }
    }

    /// Returns `true` once [`release`](Self::release) has run.
    pub const fn is_released(&self) -> bool {
        self.channel.is_none()
    }

    /// Releases the channel.
    ///
    /// The client counts as released even when closing the channel fails;
    /// that failure is returned. Later operations, including a second
    /// release, fail with [`Error::InvalidArgument`] without touching any
    /// channel.
    pub fn release(&mut self) -> Result<()> {
        let mut channel = self
            .channel
            .take()
            .ok_or(Error::InvalidArgument("client already released"))?;
        channel.close().map_err(|e| {
            debug!(error = %e, "channel close failed during release");
            Error::from(e)
        })
    }

    /// Fails if the client has been released.
    fn ensure_bound(&self) -> Result<()> {
        if self.channel.is_some() {
            Ok(())
        } else {
            Err(Error::InvalidArgument("client already released"))
        }
    }

    /// Runs one request/response cycle and classifies the response.
    fn request(&mut self, request: Request) -> Result<Dictionary> {
        let request_type = request.request_type();
        let channel = self
            .channel
            .as_mut()
            .ok_or(Error::InvalidArgument("client already released"))?;
        self.last_status = STATUS_UNKNOWN;

        trace!(request_type, "sending request");
        channel.send(&request.into_value()).map_err(|e| {
            debug!(request_type, error = %e, "could not send request");
            Error::from(e)
        })?;
        let reply = channel.receive().map_err(|e| {
            debug!(request_type, error = %e, "could not receive response");
            Error::from(e)
        })?;

        let outcome = response::classify(reply);
        self.last_status = match &outcome {
            Ok(_) => STATUS_SUCCESS,
            Err(e) => {
                debug!(request_type, error = %e, "request not acknowledged");
                e.code()
            }
        };
        outcome
    }
}
