//! Profile commands: install, list, remove, remove-all.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use mcinstall::{Error, ProfileBlob, ProfileListing, ProfileMetadata};
use serde::Serialize;

use crate::{Client, OutputFormat};

/// Profiles at or above this size are refused (16 MiB).
const MAX_PROFILE_SIZE: u64 = 0x100_0000;

/// Arguments for `mcinstall install`.
#[derive(clap::Args)]
pub struct InstallArgs {
    /// Path to a .mobileconfig file.
    pub file: PathBuf,
}

/// Arguments for `mcinstall list`.
#[derive(clap::Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for `mcinstall remove`.
#[derive(clap::Args)]
pub struct RemoveArgs {
    /// Identifier of the profile to remove.
    pub identifier: String,
}

/// One profile in `list --format json` output.
#[derive(Serialize)]
struct ListEntry<'a> {
    identifier: &'a str,
    #[serde(flatten)]
    metadata: ProfileMetadata,
}

/// Reads a profile file, refusing files of 16 MiB or more.
pub fn read_profile(path: &Path) -> Result<ProfileBlob> {
    let size = fs::metadata(path)
        .with_context(|| format!("could not open file '{}'", path.display()))?
        .len();
    if size >= MAX_PROFILE_SIZE {
        bail!("the file '{}' is too large for processing", path.display());
    }
    let data = fs::read(path).with_context(|| format!("could not read file '{}'", path.display()))?;
    Ok(ProfileBlob::new(data))
}

pub fn install(client: &mut Client, path: &Path, profile: &ProfileBlob) -> Result<()> {
    if let Err(e) = client.install(profile) {
        return Err(failure(
            &format!("could not install profile '{}'", path.display()),
            client.last_status(),
            &e,
        ));
    }
    println!("Profile '{}' installed successfully.", path.display());
    client.release()?;
    Ok(())
}

pub fn list(client: &mut Client, format: OutputFormat) -> Result<()> {
    let listing = client.list().map_err(|e| {
        failure(
            "could not get installed profiles from device",
            client.last_status(),
            &e,
        )
    })?;
    client.release()?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", to_json(&listing)?);
        return Ok(());
    }

    let n = listing.len();
    println!(
        "Device has {n} configuration {}{}",
        if n == 1 { "profile" } else { "profiles" },
        if n == 0 { " installed." } else { " installed:" }
    );
    for (id, meta) in listing.entries() {
        println!("{}", describe(id, meta));
    }
    Ok(())
}

pub fn remove(client: &mut Client, identifier: &str) -> Result<()> {
    let listing = client.list().map_err(|e| {
        failure(
            "could not get installed profiles from device",
            client.last_status(),
            &e,
        )
    })?;
    if !listing.identifiers().iter().any(|id| id == identifier) {
        bail!("no profile with identifier '{identifier}' is installed");
    }
    let identity = listing
        .identity(identifier)
        .ok_or_else(|| anyhow!("profile '{identifier}' has no UUID or version on record"))?;

    if let Err(e) = client.remove(&identity) {
        return Err(failure(
            &format!("could not remove profile '{identifier}'"),
            client.last_status(),
            &e,
        ));
    }
    println!("Profile '{identifier}' removed.");
    client.release()?;
    Ok(())
}

pub fn remove_all(client: &mut Client) -> Result<()> {
    let listing = client.list().map_err(|e| {
        failure(
            "could not get installed profiles from device",
            client.last_status(),
            &e,
        )
    })?;

    let mut failed = 0usize;
    for id in listing.identifiers() {
        let outcome = match listing.identity(id) {
            Some(identity) => client.remove(&identity).map_err(|e| {
                failure(
                    &format!("could not remove profile '{id}'"),
                    client.last_status(),
                    &e,
                )
            }),
            None => Err(anyhow!("profile '{id}' has no UUID or version on record")),
        };
        match outcome {
            Ok(()) => println!("Profile '{id}' removed."),
            Err(e) => {
                eprintln!("mcinstall: {e:#}");
                failed += 1;
            }
        }
    }
    client.release()?;

    if failed > 0 {
        bail!("{failed} of {} profiles could not be removed", listing.len());
    }
    Ok(())
}

/// Ordered profiles as a pretty-printed JSON array.
fn to_json(listing: &ProfileListing) -> serde_json::Result<String> {
    let entries: Vec<_> = listing
        .entries()
        .map(|(identifier, meta)| ListEntry {
            identifier,
            metadata: meta.cloned().unwrap_or_default(),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

/// One `list` line: identifier, UUID and display name.
fn describe(identifier: &str, meta: Option<&ProfileMetadata>) -> String {
    let uuid = meta.and_then(|m| m.uuid.as_deref()).unwrap_or("(unknown id)");
    let name = meta
        .and_then(|m| m.display_name.as_deref())
        .unwrap_or("(no name)");
    format!("{identifier} - {uuid} - {name}")
}

/// Prints the device's error chain and builds the command error.
fn failure(action: &str, status: i32, err: &Error) -> anyhow::Error {
    for (i, line) in err.diagnostics().iter().enumerate() {
        eprintln!("Error {i} : {line}");
    }
    if err.diagnostics().is_empty() {
        anyhow!("{action}, status code: 0x{status:x}: {err}")
    } else {
        anyhow!("{action}, status code: 0x{status:x}")
    }
}
