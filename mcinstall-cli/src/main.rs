//! CLI for managing configuration profiles on a mobile device.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod profiles;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use mcinstall::{Channel, FramedChannel, ProfileClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mcinstall",
    version,
    about = "Manage configuration profiles on a device"
)]
struct Cli {
    /// TCP endpoint of the started profile service (HOST:PORT).
    #[arg(long, env = "MCINSTALL_CONNECT", conflicts_with = "socket")]
    connect: Option<String>,

    /// Unix socket of the started profile service.
    #[arg(long, env = "MCINSTALL_SOCKET")]
    socket: Option<PathBuf>,

    /// Enable communication debugging.
    #[arg(short = 'd', long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install a configuration profile from a .mobileconfig file.
    Install(profiles::InstallArgs),

    /// List configuration profiles installed on the device.
    #[command(visible_alias = "ls")]
    List(profiles::ListArgs),

    /// Remove the configuration profile with the given identifier.
    #[command(visible_alias = "rm")]
    Remove(profiles::RemoveArgs),

    /// Remove all installed configuration profiles.
    RemoveAll,

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for the list command.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

/// A client over whichever transport the endpoint options selected.
pub(crate) type Client = ProfileClient<Box<dyn Channel>>;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.check_endpoint() {
        e.exit();
    }
    init_logging(cli.debug);
    if let Err(e) = cli.dispatch() {
        eprintln!("mcinstall: {e:#}");
        std::process::exit(1);
    }
}

/// Logs to stderr, filtered by `RUST_LOG` unless `--debug` is given.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    /// Rejects device commands given without a service endpoint.
    fn check_endpoint(&self) -> Result<(), clap::Error> {
        let needs_device = !matches!(self.command, Command::Completion { .. });
        if needs_device && self.connect.is_none() && self.socket.is_none() {
            return Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "a service endpoint is required: pass --connect or --socket",
            ));
        }
        Ok(())
    }

    fn dispatch(self) -> Result<()> {
        match self.command {
            Command::Install(ref args) => {
                // Refuse unreadable or oversized files before touching the device.
                let profile = profiles::read_profile(&args.file)?;
                profiles::install(&mut self.open()?, &args.file, &profile)
            }
            Command::List(ref args) => profiles::list(&mut self.open()?, args.format),
            Command::Remove(ref args) => profiles::remove(&mut self.open()?, &args.identifier),
            Command::RemoveAll => profiles::remove_all(&mut self.open()?),
            Command::Completion { shell } => {
                clap_complete::generate(
                    shell,
                    &mut Self::command(),
                    "mcinstall",
                    &mut std::io::stdout(),
                );
                Ok(())
            }
        }
    }

    /// Connects to the configured service endpoint.
    fn open(&self) -> Result<Client> {
        let channel: Box<dyn Channel> = match (&self.connect, &self.socket) {
            (Some(addr), _) => Box::new(
                FramedChannel::connect_tcp(addr.as_str())
                    .with_context(|| format!("could not connect to {addr}"))?,
            ),
            (None, Some(path)) => open_unix(path)?,
            (None, None) => bail!("no service endpoint: pass --connect or --socket"),
        };
        tracing::debug!(service = mcinstall::SERVICE_NAME, "connected");
        Ok(ProfileClient::bind(channel))
    }
}

#[cfg(unix)]
fn open_unix(path: &std::path::Path) -> Result<Box<dyn Channel>> {
    let channel = FramedChannel::connect_unix(path)
        .with_context(|| format!("could not connect to {}", path.display()))?;
    Ok(Box::new(channel))
}

#[cfg(not(unix))]
fn open_unix(_path: &std::path::Path) -> Result<Box<dyn Channel>> {
    bail!("Unix sockets are not supported on this platform")
}
