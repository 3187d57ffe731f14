//! Table key/value layouts (§3, §6).
//!
//! Every struct here is `#[repr(C)]` with explicit padding fields so the
//! byte layout is fully deterministic — BPF hash maps hash the raw bytes
//! of the key, so indeterminate padding would make two logically-equal
//! keys hash differently.

/// IPv4 flow key: {saddr, daddr, sport, dport, proto} + 3 bytes explicit
/// padding after `proto` (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlowKeyV4 {
    pub saddr: u32,
    pub daddr: u32,
    pub sport: u16,
    pub dport: u16,
    pub proto: u8,
    pub _pad: [u8; 3],
}

impl FlowKeyV4 {
    pub fn new(saddr: u32, daddr: u32, sport: u16, dport: u16, proto: u8) -> Self {
        Self { saddr, daddr, sport, dport, proto, _pad: [0; 3] }
    }
}

/// IPv6 flow key: {saddr[16], daddr[16], sport, dport, proto} + explicit
/// trailing padding for deterministic layout (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlowKeyV6 {
    pub saddr: [u8; 16],
    pub daddr: [u8; 16],
    pub sport: u16,
    pub dport: u16,
    pub proto: u8,
    pub _pad: [u8; 3],
}

impl FlowKeyV6 {
    pub fn new(saddr: [u8; 16], daddr: [u8; 16], sport: u16, dport: u16, proto: u8) -> Self {
        Self { saddr, daddr, sport, dport, proto, _pad: [0; 3] }
    }
}

/// Bypass record written by the external deep-inspector: identical shape to
/// the flow key plus a 1-byte direction (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BypassRecordV4 {
    pub key: FlowKeyV4,
    pub direction: u8,
    pub _pad: [u8; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BypassRecordV6 {
    pub key: FlowKeyV6,
    pub direction: u8,
    pub _pad: [u8; 3],
}

/// `{family, address[16]}` — the v4 address lives in the first 4 bytes with
/// the remainder zero (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WhitelistKey {
    pub family: u8,
    pub _pad: [u8; 3],
    pub addr: [u8; 16],
}

impl WhitelistKey {
    pub fn v4(addr: [u8; 4]) -> Self {
        let mut full = [0u8; 16];
        full[..4].copy_from_slice(&addr);
        Self { family: crate::consts::FAMILY_V4, _pad: [0; 3], addr: full }
    }

    pub fn v6(addr: [u8; 16]) -> Self {
        Self { family: crate::consts::FAMILY_V6, _pad: [0; 3], addr }
    }
}

/// `{family, type, code}` ICMP allow-list key (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IcmpAllowKey {
    pub family: u8,
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub _pad: u8,
}

impl IcmpAllowKey {
    pub fn new(family: u8, icmp_type: u8, icmp_code: u8) -> Self {
        Self { family, icmp_type, icmp_code, _pad: 0 }
    }
}

/// Per-source key shared by the TCP SYN limiter and the UDP token bucket:
/// `{is_v6, addr[16]}` (§4.9 — "Per `{is_v6, src_addr}`").
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub is_v6: u8,
    pub _pad: [u8; 3],
    pub addr: [u8; 16],
}

impl RateKey {
    pub fn v4(addr: [u8; 4]) -> Self {
        let mut full = [0u8; 16];
        full[..4].copy_from_slice(&addr);
        Self { is_v6: 0, _pad: [0; 3], addr: full }
    }

    pub fn v6(addr: [u8; 16]) -> Self {
        Self { is_v6: 1, _pad: [0; 3], addr }
    }
}

/// TCP SYN rate-limiter state: `{window_start_ns, syn_count}` (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TcpRateState {
    pub window_start_ns: u64,
    pub syn_count: u32,
    pub _pad: u32,
}

/// UDP token-bucket state: `{last_seen_ns, tokens}` (§3).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UdpTokenBucket {
    pub last_seen_ns: u64,
    pub tokens: u32,
    pub _pad: u32,
}

/// Token-bucket / SYN-window tunables, read from the `rate_limit_cfg` table;
/// absent entries fall back to `RateLimitConfig::default()` (§3, §7).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub refill_period_ns: u64,
    pub burst: u32,
    pub _pad: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            refill_period_ns: crate::consts::DEFAULT_REFILL_PERIOD_NS,
            burst: crate::consts::DEFAULT_BURST,
            _pad: 0,
        }
    }
}

// SAFETY: every struct above is `#[repr(C)]`, `Copy`, and has no implicit
// padding beyond the explicit `_pad` fields, so reading it out of a BPF map
// as raw bytes can never observe uninitialized memory.
#[cfg(feature = "aya-pod")]
mod pod_impls {
    use super::*;

    unsafe impl aya::Pod for FlowKeyV4 {}
    unsafe impl aya::Pod for FlowKeyV6 {}
    unsafe impl aya::Pod for BypassRecordV4 {}
    unsafe impl aya::Pod for BypassRecordV6 {}
    unsafe impl aya::Pod for WhitelistKey {}
    unsafe impl aya::Pod for IcmpAllowKey {}
    unsafe impl aya::Pod for RateKey {}
    unsafe impl aya::Pod for TcpRateState {}
    unsafe impl aya::Pod for UdpTokenBucket {}
    unsafe impl aya::Pod for RateLimitConfig {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    #[test]
    fn flow_key_v4_is_16_bytes_with_no_implicit_padding() {
        assert_eq!(size_of::<FlowKeyV4>(), 16);
    }

    #[test]
    fn flow_key_v6_is_40_bytes_with_no_implicit_padding() {
        assert_eq!(size_of::<FlowKeyV6>(), 40);
    }

    #[test]
    fn whitelist_key_is_20_bytes() {
        assert_eq!(size_of::<WhitelistKey>(), 20);
    }

    #[test]
    fn rate_key_is_20_bytes() {
        assert_eq!(size_of::<RateKey>(), 20);
    }

    #[test]
    fn whitelist_key_v4_zero_extends_address() {
        let k = WhitelistKey::v4([203, 0, 113, 5]);
        assert_eq!(k.family, crate::consts::FAMILY_V4);
        assert_eq!(&k.addr[..4], &[203, 0, 113, 5]);
        assert!(k.addr[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn rate_limit_config_default_matches_spec() {
        let cfg = RateLimitConfig::default();
        assert_eq!(cfg.refill_period_ns, 1_000_000);
        assert_eq!(cfg.burst, 100);
    }
}
