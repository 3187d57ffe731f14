//! TOML configuration for the loader: which interface to attach to and the
//! initial contents of the control-plane tables (§6).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{LoaderError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    /// Network interface to attach the whitelist stage to.
    pub interface: String,

    /// IPv4/IPv6 addresses admitted unconditionally by the whitelist stage.
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// IPv4/IPv6 addresses dropped unconditionally by the blacklist stage.
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Destination ports admitted by the ACL stage (`n` < 64).
    #[serde(default)]
    pub acl_ports: Vec<u16>,

    /// `{family, type, code}` triples admitted by the ACL stage's ICMP path.
    #[serde(default)]
    pub icmp_allow: Vec<IcmpAllowEntry>,

    /// Initial panic-stage emergency shutoff (§4.3). Defaults to inactive.
    #[serde(default)]
    pub panic: bool,

    /// Initial deep-inspector global bypass flag (§4.7). Defaults to unset.
    #[serde(default)]
    pub global_bypass: bool,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct IcmpAllowEntry {
    pub family: IcmpFamily,
    pub icmp_type: u8,
    pub icmp_code: u8,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IcmpFamily {
    V4,
    V6,
}

impl IcmpFamily {
    pub fn as_family_tag(self) -> u8 {
        match self {
            IcmpFamily::V4 => wardenxdp_common::FAMILY_V4,
            IcmpFamily::V6 => wardenxdp_common::FAMILY_V6,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RateLimitSettings {
    #[serde(default = "default_refill_period_ns")]
    pub refill_period_ns: u64,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { refill_period_ns: default_refill_period_ns(), burst: default_burst() }
    }
}

fn default_refill_period_ns() -> u64 {
    wardenxdp_common::DEFAULT_REFILL_PERIOD_NS
}

fn default_burst() -> u32 {
    wardenxdp_common::DEFAULT_BURST
}

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<LoaderConfig> {
    let txt = fs::read_to_string(p)
        .map_err(|e| LoaderError::Config(format!("failed to read config file: {e}")))?;
    let cfg: LoaderConfig = toml::from_str(&txt)
        .map_err(|e| LoaderError::Config(format!("failed to parse config: {e}")))?;

    if cfg.acl_ports.iter().any(|&p| p >= 64) {
        return Err(LoaderError::Config(
            "acl_ports entries must be < 64 (bitmap width)".to_string(),
        ));
    }

    Ok(cfg)
}
