//! Userspace side of the XDP packet-filter pipeline: loads the compiled
//! kernel object, attaches the whitelist stage, wires the jump table, and
//! exposes typed accessors for every control-plane table (§6).
#![cfg(target_os = "linux")]

pub mod config;
pub mod control;
pub mod probe;
pub mod stats;
pub mod tables;

pub use config::LoaderConfig;
pub use probe::{ControlMaps, Pipeline};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to load BPF object: {0}")]
    Load(#[source] aya::EbpfError),

    #[error("XDP program '{0}' not found in BPF object")]
    ProgramNotFound(&'static str),

    #[error("BPF program is not an XDP program: {0}")]
    ProgramType(#[source] aya::programs::ProgramError),

    #[error("failed to load XDP program into kernel: {0}")]
    ProgramLoad(#[source] aya::programs::ProgramError),

    #[error("failed to attach XDP program to interface: {0}")]
    Attach(#[source] aya::programs::ProgramError),

    #[error("jump-table slot {0} rejected the program: {1}")]
    TailCallSlot(u32, String),

    #[error("map '{0}' not found in BPF object")]
    MapNotFound(&'static str),

    #[error("map '{0}' has an unexpected type: {1}")]
    MapType(&'static str, #[source] aya::maps::MapError),

    #[error("map operation failed: {0}")]
    Map(#[from] aya::maps::MapError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
