//! Integration-style tests for `tables.rs`'s typed wrappers, driven by an
//! in-memory fake `TableWriter` instead of a loaded BPF pipeline.

use std::collections::HashSet;
use std::net::IpAddr;

use wardenxdp_common::{IcmpAllowKey, WhitelistKey, FAMILY_V4};
use wardenxdp_loader::tables::{self, TableWriter};
use wardenxdp_loader::Result;

#[derive(Default)]
struct FakeTables {
    whitelist: HashSet<WhitelistKey>,
    blacklist_v4: HashSet<u32>,
    blacklist_v6: HashSet<[u8; 16]>,
    icmp_allow: HashSet<IcmpAllowKey>,
    panic: bool,
    global_bypass: bool,
    acl_bitmap: u64,
}

impl TableWriter for FakeTables {
    fn whitelist_insert(&mut self, key: WhitelistKey, _value: u8) -> Result<()> {
        self.whitelist.insert(key);
        Ok(())
    }

    fn whitelist_remove(&mut self, key: &WhitelistKey) -> Result<()> {
        self.whitelist.remove(key);
        Ok(())
    }

    fn blacklist_v4_insert(&mut self, key: u32, _value: u8) -> Result<()> {
        self.blacklist_v4.insert(key);
        Ok(())
    }

    fn blacklist_v4_remove(&mut self, key: &u32) -> Result<()> {
        self.blacklist_v4.remove(key);
        Ok(())
    }

    fn blacklist_v6_insert(&mut self, key: [u8; 16], _value: u8) -> Result<()> {
        self.blacklist_v6.insert(key);
        Ok(())
    }

    fn blacklist_v6_remove(&mut self, key: &[u8; 16]) -> Result<()> {
        self.blacklist_v6.remove(key);
        Ok(())
    }

    fn icmp_allow_insert(&mut self, key: IcmpAllowKey, _value: u8) -> Result<()> {
        self.icmp_allow.insert(key);
        Ok(())
    }

    fn set_panic_flag(&mut self, active: u8) -> Result<()> {
        self.panic = active != 0;
        Ok(())
    }

    fn set_global_bypass_flag(&mut self, active: u8) -> Result<()> {
        self.global_bypass = active != 0;
        Ok(())
    }

    fn set_acl_bitmap(&mut self, bitmap: u64) -> Result<()> {
        self.acl_bitmap = bitmap;
        Ok(())
    }
}

fn addr(s: &str) -> IpAddr {
    s.parse().expect("valid address literal")
}

#[test]
fn whitelist_add_and_del_round_trip() {
    let mut fake = FakeTables::default();
    tables::whitelist_add(&mut fake, addr("203.0.113.5")).unwrap();
    assert!(fake.whitelist.contains(&WhitelistKey::v4([203, 0, 113, 5])));

    tables::whitelist_del(&mut fake, addr("203.0.113.5")).unwrap();
    assert!(fake.whitelist.is_empty());
}

#[test]
fn blacklist_add_routes_v4_and_v6_to_distinct_tables() {
    let mut fake = FakeTables::default();
    tables::blacklist_add(&mut fake, addr("198.51.100.7")).unwrap();
    tables::blacklist_add(&mut fake, addr("2001:db8::2")).unwrap();

    assert_eq!(fake.blacklist_v4.len(), 1);
    assert_eq!(fake.blacklist_v6.len(), 1);

    tables::blacklist_del(&mut fake, addr("198.51.100.7")).unwrap();
    assert!(fake.blacklist_v4.is_empty());
}

#[test]
fn set_acl_ports_builds_expected_bitmap() {
    let mut fake = FakeTables::default();
    tables::set_acl_ports(&mut fake, &[0, 22, 63]).unwrap();
    assert_eq!(fake.acl_bitmap, (1u64 << 0) | (1u64 << 22) | (1u64 << 63));
}

#[test]
fn set_acl_ports_rejects_port_above_bitmap_width_without_mutating() {
    let mut fake = FakeTables::default();
    let result = tables::set_acl_ports(&mut fake, &[22, 64]);
    assert!(result.is_err());
    assert_eq!(fake.acl_bitmap, 0, "a rejected batch must not partially apply");
}

#[test]
fn panic_and_global_bypass_flags_are_independent() {
    let mut fake = FakeTables::default();
    tables::set_panic(&mut fake, true).unwrap();
    assert!(fake.panic);
    assert!(!fake.global_bypass);

    tables::set_global_bypass(&mut fake, true).unwrap();
    tables::set_panic(&mut fake, false).unwrap();
    assert!(!fake.panic);
    assert!(fake.global_bypass);
}

#[test]
fn icmp_allow_add_inserts_the_requested_triple() {
    let mut fake = FakeTables::default();
    tables::icmp_allow_add(&mut fake, FAMILY_V4, 8, 0).unwrap();
    assert!(fake.icmp_allow.contains(&IcmpAllowKey::new(FAMILY_V4, 8, 0)));
    assert_eq!(fake.icmp_allow.len(), 1);
}
