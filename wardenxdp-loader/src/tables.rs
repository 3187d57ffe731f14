//! Typed control-plane operations over the tables `probe::Pipeline` exposes
//! (§6). These wrap the raw `aya` map handles with the address-parsing and
//! key-construction logic the CLI and daemon both need.
//!
//! The functions below are generic over [`TableWriter`] rather than taking
//! `&mut Pipeline` directly, so they can be driven by an in-memory fake in
//! tests instead of a loaded BPF object — the same repository/trait split
//! `sase-common`'s `PolicyRepository` uses to keep its domain logic
//! testable without a real store behind it.

use std::net::IpAddr;

use wardenxdp_common::{IcmpAllowKey, WhitelistKey};

use crate::probe::Pipeline;
use crate::{LoaderError, Result};

/// Abstracts the raw table writes a loaded [`Pipeline`] performs, so
/// `whitelist_add` and friends can run against either a real pipeline or an
/// in-memory fake.
pub trait TableWriter {
    fn whitelist_insert(&mut self, key: WhitelistKey, value: u8) -> Result<()>;
    fn whitelist_remove(&mut self, key: &WhitelistKey) -> Result<()>;
    fn blacklist_v4_insert(&mut self, key: u32, value: u8) -> Result<()>;
    fn blacklist_v4_remove(&mut self, key: &u32) -> Result<()>;
    fn blacklist_v6_insert(&mut self, key: [u8; 16], value: u8) -> Result<()>;
    fn blacklist_v6_remove(&mut self, key: &[u8; 16]) -> Result<()>;
    fn icmp_allow_insert(&mut self, key: IcmpAllowKey, value: u8) -> Result<()>;
    fn set_panic_flag(&mut self, active: u8) -> Result<()>;
    fn set_global_bypass_flag(&mut self, active: u8) -> Result<()>;
    fn set_acl_bitmap(&mut self, bitmap: u64) -> Result<()>;
}

impl TableWriter for Pipeline {
    fn whitelist_insert(&mut self, key: WhitelistKey, value: u8) -> Result<()> {
        self.whitelist()?.insert(key, value, 0).map_err(LoaderError::from)
    }

    fn whitelist_remove(&mut self, key: &WhitelistKey) -> Result<()> {
        self.whitelist()?.remove(key).map_err(LoaderError::from)
    }

    fn blacklist_v4_insert(&mut self, key: u32, value: u8) -> Result<()> {
        self.ipv4_drop()?.insert(key, value, 0).map_err(LoaderError::from)
    }

    fn blacklist_v4_remove(&mut self, key: &u32) -> Result<()> {
        self.ipv4_drop()?.remove(key).map_err(LoaderError::from)
    }

    fn blacklist_v6_insert(&mut self, key: [u8; 16], value: u8) -> Result<()> {
        self.ipv6_drop()?.insert(key, value, 0).map_err(LoaderError::from)
    }

    fn blacklist_v6_remove(&mut self, key: &[u8; 16]) -> Result<()> {
        self.ipv6_drop()?.remove(key).map_err(LoaderError::from)
    }

    fn icmp_allow_insert(&mut self, key: IcmpAllowKey, value: u8) -> Result<()> {
        self.icmp_allow()?.insert(key, value, 0).map_err(LoaderError::from)
    }

    fn set_panic_flag(&mut self, active: u8) -> Result<()> {
        self.panic_flag()?.set(0, active, 0).map_err(LoaderError::from)
    }

    fn set_global_bypass_flag(&mut self, active: u8) -> Result<()> {
        self.global_bypass()?.set(0, active, 0).map_err(LoaderError::from)
    }

    fn set_acl_bitmap(&mut self, bitmap: u64) -> Result<()> {
        self.acl_ports()?.set(0, bitmap, 0).map_err(LoaderError::from)
    }
}

/// Add `addr` to the whitelist: immediate PASS at the whitelist stage (§4.2).
pub fn whitelist_add<T: TableWriter>(tables: &mut T, addr: IpAddr) -> Result<()> {
    tables.whitelist_insert(whitelist_key(addr), 1u8)
}

/// Remove `addr` from the whitelist.
pub fn whitelist_del<T: TableWriter>(tables: &mut T, addr: IpAddr) -> Result<()> {
    tables.whitelist_remove(&whitelist_key(addr))
}

/// Add `addr` to the blacklist: unconditional DROP at the blacklist stage (§4.5).
pub fn blacklist_add<T: TableWriter>(tables: &mut T, addr: IpAddr) -> Result<()> {
    match addr {
        IpAddr::V4(v4) => tables.blacklist_v4_insert(u32::from_be_bytes(v4.octets()), 1u8),
        IpAddr::V6(v6) => tables.blacklist_v6_insert(v6.octets(), 1u8),
    }
}

pub fn blacklist_del<T: TableWriter>(tables: &mut T, addr: IpAddr) -> Result<()> {
    match addr {
        IpAddr::V4(v4) => tables.blacklist_v4_remove(&u32::from_be_bytes(v4.octets())),
        IpAddr::V6(v6) => tables.blacklist_v6_remove(&v6.octets()),
    }
}

/// Set or clear the panic-stage emergency shutoff (§4.3).
pub fn set_panic<T: TableWriter>(tables: &mut T, active: bool) -> Result<()> {
    tables.set_panic_flag(u8::from(active))
}

/// Set or clear the deep-inspector global bypass flag (§4.7).
pub fn set_global_bypass<T: TableWriter>(tables: &mut T, active: bool) -> Result<()> {
    tables.set_global_bypass_flag(u8::from(active))
}

/// Admit `{family, type, code}` at the ACL stage's ICMP path (§4.4).
pub fn icmp_allow_add<T: TableWriter>(
    tables: &mut T,
    family: u8,
    icmp_type: u8,
    icmp_code: u8,
) -> Result<()> {
    tables.icmp_allow_insert(IcmpAllowKey::new(family, icmp_type, icmp_code), 1u8)
}

/// Replace the ACL destination-port bitmap (§4.4, §6). Port `n` is admitted
/// iff bit `n` is set; ports ≥ 64 cannot be represented.
pub fn set_acl_ports<T: TableWriter>(tables: &mut T, ports: &[u16]) -> Result<()> {
    let mut bitmap = 0u64;
    for &port in ports {
        if port >= 64 {
            return Err(LoaderError::Config(format!("ACL port {port} is out of the 64-bit bitmap range")));
        }
        bitmap |= 1u64 << port;
    }
    tables.set_acl_bitmap(bitmap)
}

fn whitelist_key(addr: IpAddr) -> WhitelistKey {
    match addr {
        IpAddr::V4(v4) => WhitelistKey::v4(v4.octets()),
        IpAddr::V6(v6) => WhitelistKey::v6(v6.octets()),
    }
}
