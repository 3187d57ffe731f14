//! Whitelist edits against a running pipeline's pinned tables (§6), used by
//! `wardenxdp-cli`. Unlike [`crate::tables`], these operate on
//! [`ControlMaps`] and never load or attach a program.

use std::net::IpAddr;

use wardenxdp_common::WhitelistKey;

use crate::probe::ControlMaps;
use crate::{LoaderError, Result};

/// Abstracts the pinned-map write [`ControlMaps`] performs, so the CLI's
/// whitelist edits can run against either a real pinned map or an
/// in-memory fake.
pub trait ControlWriter {
    fn whitelist_insert(&self, key: WhitelistKey, value: u8) -> Result<()>;
    fn whitelist_remove(&self, key: &WhitelistKey) -> Result<()>;
}

impl ControlWriter for ControlMaps {
    fn whitelist_insert(&self, key: WhitelistKey, value: u8) -> Result<()> {
        self.whitelist()?.insert(key, value, 0).map_err(LoaderError::from)
    }

    fn whitelist_remove(&self, key: &WhitelistKey) -> Result<()> {
        self.whitelist()?.remove(key).map_err(LoaderError::from)
    }
}

pub fn whitelist_add<T: ControlWriter>(maps: &T, addr: IpAddr) -> Result<()> {
    maps.whitelist_insert(whitelist_key(addr), 1u8)
}

pub fn whitelist_del<T: ControlWriter>(maps: &T, addr: IpAddr) -> Result<()> {
    maps.whitelist_remove(&whitelist_key(addr))
}

fn whitelist_key(addr: IpAddr) -> WhitelistKey {
    match addr {
        IpAddr::V4(v4) => WhitelistKey::v4(v4.octets()),
        IpAddr::V6(v6) => WhitelistKey::v6(v6.octets()),
    }
}
