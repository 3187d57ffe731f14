//! Stage-local pure decision helpers shared by the XDP stages and their
//! host-side tests (§4.2, §4.4, §4.7): ICMP echo classification, the ACL
//! bitmap predicate, and the deep-inspector gate's flow-key hash.

use crate::consts::{
    FAMILY_V4, FAMILY_V6, ICMP_ECHO_REPLY_V4, ICMP_ECHO_REPLY_V6, ICMP_ECHO_REQUEST_V4,
    ICMP_ECHO_REQUEST_V6,
};
use crate::keys::{FlowKeyV4, FlowKeyV6};

/// Whether `{family, icmp_type}` is an echo request/reply that requires
/// explicit whitelisting on a whitelist miss (§4.2).
pub fn is_icmp_echo(family: u8, icmp_type: u8) -> bool {
    match family {
        FAMILY_V4 => icmp_type == ICMP_ECHO_REQUEST_V4 || icmp_type == ICMP_ECHO_REPLY_V4,
        FAMILY_V6 => icmp_type == ICMP_ECHO_REQUEST_V6 || icmp_type == ICMP_ECHO_REPLY_V6,
        _ => false,
    }
}

/// ACL bitmap admission: bit `dport` set and `dport < 64` (§4.4).
pub fn acl_port_allowed(bitmap: u64, dport: u16) -> bool {
    dport < 64 && (bitmap & (1u64 << dport)) != 0
}

/// 14-bit deep-inspector gate hash for an IPv4 flow key (§4.7):
/// `saddr ^ daddr ^ (sport<<16|dport) ^ proto`, folded to 14 bits.
pub fn bypass_hash_v4(key: &FlowKeyV4) -> u16 {
    let ports = (u32::from(key.sport) << 16) | u32::from(key.dport);
    let folded = key.saddr ^ key.daddr ^ ports ^ u32::from(key.proto);
    (folded & ((1 << crate::consts::BYPASS_HASH_BITS) - 1)) as u16
}

/// 14-bit deep-inspector gate hash for an IPv6 flow key (§4.7): xor-fold the
/// two 64-bit halves of each address, combined the same way as the v4 hash.
pub fn bypass_hash_v6(key: &FlowKeyV6) -> u16 {
    let fold_addr = |addr: &[u8; 16]| -> u32 {
        let hi = u64::from_be_bytes(addr[0..8].try_into().unwrap());
        let lo = u64::from_be_bytes(addr[8..16].try_into().unwrap());
        ((hi ^ lo) & 0xFFFF_FFFF) as u32
    };
    let ports = (u32::from(key.sport) << 16) | u32::from(key.dport);
    let folded = fold_addr(&key.saddr) ^ fold_addr(&key.daddr) ^ ports ^ u32::from(key.proto);
    (folded & ((1 << crate::consts::BYPASS_HASH_BITS) - 1)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icmp_echo_v4_types() {
        assert!(is_icmp_echo(FAMILY_V4, 0));
        assert!(is_icmp_echo(FAMILY_V4, 8));
        assert!(!is_icmp_echo(FAMILY_V4, 3));
    }

    #[test]
    fn icmp_echo_v6_types() {
        assert!(is_icmp_echo(FAMILY_V6, 128));
        assert!(is_icmp_echo(FAMILY_V6, 129));
        assert!(!is_icmp_echo(FAMILY_V6, 1));
    }

    #[test]
    fn acl_bitmap_admits_only_set_bits_under_64() {
        let bitmap = (1u64 << 0) | (1u64 << 63);
        assert!(acl_port_allowed(bitmap, 0));
        assert!(acl_port_allowed(bitmap, 63));
        assert!(!acl_port_allowed(bitmap, 1));
        assert!(!acl_port_allowed(bitmap, 64));
        assert!(!acl_port_allowed(bitmap, 80));
    }

    #[test]
    fn bypass_hash_is_deterministic_and_bounded() {
        let key = FlowKeyV4::new(1, 2, 3, 4, 6);
        let h1 = bypass_hash_v4(&key);
        let h2 = bypass_hash_v4(&key);
        assert_eq!(h1, h2);
        assert!(h1 < (1 << crate::consts::BYPASS_HASH_BITS));
    }

    #[test]
    fn bypass_hash_v6_is_deterministic_and_bounded() {
        let key = FlowKeyV6::new([1; 16], [2; 16], 3, 4, 6);
        let h1 = bypass_hash_v6(&key);
        let h2 = bypass_hash_v6(&key);
        assert_eq!(h1, h2);
        assert!(h1 < (1 << crate::consts::BYPASS_HASH_BITS));
    }
}
