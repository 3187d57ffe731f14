//! Integration-style tests for `control.rs`'s CLI-facing whitelist edits,
//! driven by an in-memory fake `ControlWriter` instead of a pinned map.

use std::cell::RefCell;
use std::collections::HashSet;
use std::net::IpAddr;

use wardenxdp_common::WhitelistKey;
use wardenxdp_loader::control::{self, ControlWriter};
use wardenxdp_loader::Result;

#[derive(Default)]
struct FakeControlMaps {
    whitelist: RefCell<HashSet<WhitelistKey>>,
}

impl ControlWriter for FakeControlMaps {
    fn whitelist_insert(&self, key: WhitelistKey, _value: u8) -> Result<()> {
        self.whitelist.borrow_mut().insert(key);
        Ok(())
    }

    fn whitelist_remove(&self, key: &WhitelistKey) -> Result<()> {
        self.whitelist.borrow_mut().remove(key);
        Ok(())
    }
}

fn addr(s: &str) -> IpAddr {
    s.parse().expect("valid address literal")
}

#[test]
fn whitelist_add_inserts_v4_and_v6_keys() {
    let maps = FakeControlMaps::default();
    control::whitelist_add(&maps, addr("203.0.113.5")).unwrap();
    control::whitelist_add(&maps, addr("2001:db8::1")).unwrap();

    assert_eq!(maps.whitelist.borrow().len(), 2);
    assert!(maps.whitelist.borrow().contains(&WhitelistKey::v4([203, 0, 113, 5])));
}

#[test]
fn whitelist_del_removes_only_the_requested_entry() {
    let maps = FakeControlMaps::default();
    control::whitelist_add(&maps, addr("203.0.113.5")).unwrap();
    control::whitelist_add(&maps, addr("203.0.113.6")).unwrap();

    control::whitelist_del(&maps, addr("203.0.113.5")).unwrap();

    assert_eq!(maps.whitelist.borrow().len(), 1);
    assert!(maps.whitelist.borrow().contains(&WhitelistKey::v4([203, 0, 113, 6])));
}
