//! Control-tool surface (§6): `wardenxdp-cli {add|del} <ip>`, exit code 0 on
//! success, 1 on any error (bad arguments, unresolvable address, table
//! access failure).

mod error;

use std::net::IpAddr;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use error::CliError;
use wardenxdp_loader::{control, ControlMaps};

#[derive(Parser, Debug)]
#[command(author, version, about = "Add or remove whitelist entries in the XDP pipeline")]
struct Cli {
    /// bpffs directory the running pipeline pinned its tables under.
    #[arg(long, default_value_t = wardenxdp_loader::probe::DEFAULT_PIN_PATH.to_string())]
    pin_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Admit `ip` unconditionally at the whitelist stage.
    Add { ip: String },
    /// Remove `ip` from the whitelist.
    Del { ip: String },
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!(%err, "wardenxdp-cli failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (ip_str, add) = match &cli.command {
        Command::Add { ip } => (ip, true),
        Command::Del { ip } => (ip, false),
    };
    let addr: IpAddr = ip_str.parse().map_err(|_| CliError::BadAddress(ip_str.clone()))?;

    let maps = ControlMaps::open(&cli.pin_path);
    if add {
        control::whitelist_add(&maps, addr)?;
    } else {
        control::whitelist_del(&maps, addr)?;
    }
    Ok(())
}
