//! Pure, bounds-checked frame parsing (§4.1).
//!
//! Operates on a plain `&[u8]` byte window rather than a kernel context, so
//! the exact same code runs inside the XDP program (over a slice built from
//! `ctx.data()`/`ctx.data_end()` with a bounds check already proven to the
//! verifier) and in host-side unit tests (over a `Vec<u8>`).

use crate::consts::{ETH_P_IPV4, ETH_P_IPV6};
use crate::keys::{FlowKeyV4, FlowKeyV6};

const ETH_HDR_LEN: usize = 14;
const IPV6_HDR_LEN: usize = 40;

/// Derived per-packet L3 descriptor (§3). `src`/`dst` hold the v4 address in
/// the first 4 bytes (remainder zero) when `is_v4`, or the full v6 address
/// when `is_v6`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct L3Descriptor {
    pub is_v4: bool,
    pub is_v6: bool,
    pub header_len: usize,
    pub l4_proto: u8,
    pub src: [u8; 16],
    pub dst: [u8; 16],
}

impl L3Descriptor {
    /// Offset of the first byte of the L4 header.
    pub fn l4_offset(&self) -> usize {
        ETH_HDR_LEN + self.header_len
    }

    pub fn src_v4(&self) -> [u8; 4] {
        [self.src[0], self.src[1], self.src[2], self.src[3]]
    }
}

/// Outcome of parsing the L3 header (§7 — errors folded into verdicts).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Ethernet proto is neither IPv4 nor IPv6 — pipeline not applicable (PASS).
    NotIp,
    /// A required offset is out of bounds (DROP at the stage that hit it).
    Truncated,
    Ok(L3Descriptor),
}

/// Read the 16-bit big-endian Ethernet proto tag at offset 12 (§3).
fn eth_proto(frame: &[u8]) -> Option<u16> {
    if frame.len() < ETH_HDR_LEN {
        return None;
    }
    Some(u16::from_be_bytes([frame[12], frame[13]]))
}

/// Parse the Ethernet + IPv4/IPv6 header pair into an `L3Descriptor` (§4.1).
pub fn parse_l3(frame: &[u8]) -> ParseOutcome {
    let proto = match eth_proto(frame) {
        Some(p) => p,
        None => return ParseOutcome::Truncated,
    };

    match proto {
        ETH_P_IPV4 => parse_v4(frame),
        ETH_P_IPV6 => parse_v6(frame),
        _ => ParseOutcome::NotIp,
    }
}

fn parse_v4(frame: &[u8]) -> ParseOutcome {
    // Minimum fixed IPv4 header is 20 bytes.
    if frame.len() < ETH_HDR_LEN + 20 {
        return ParseOutcome::Truncated;
    }
    let base = ETH_HDR_LEN;
    let version_ihl = frame[base];
    let header_len = usize::from(version_ihl & 0x0F) << 2;
    if header_len < 20 || frame.len() < base + header_len {
        return ParseOutcome::Truncated;
    }
    let l4_proto = frame[base + 9];
    let mut src = [0u8; 16];
    let mut dst = [0u8; 16];
    src[..4].copy_from_slice(&frame[base + 12..base + 16]);
    dst[..4].copy_from_slice(&frame[base + 16..base + 20]);

    ParseOutcome::Ok(L3Descriptor { is_v4: true, is_v6: false, header_len, l4_proto, src, dst })
}

fn parse_v6(frame: &[u8]) -> ParseOutcome {
    if frame.len() < ETH_HDR_LEN + IPV6_HDR_LEN {
        return ParseOutcome::Truncated;
    }
    let base = ETH_HDR_LEN;
    // Extension headers are not walked (§4.1): next-header is treated as l4_proto
    // directly, whatever it names.
    let l4_proto = frame[base + 6];
    let mut src = [0u8; 16];
    let mut dst = [0u8; 16];
    src.copy_from_slice(&frame[base + 8..base + 24]);
    dst.copy_from_slice(&frame[base + 24..base + 40]);

    ParseOutcome::Ok(L3Descriptor {
        is_v4: false,
        is_v6: true,
        header_len: IPV6_HDR_LEN,
        l4_proto,
        src,
        dst,
    })
}

/// Read `{sport, dport}` at `l4_offset`/`l4_offset + 2` (§4.1).
pub fn read_l4_ports(frame: &[u8], desc: &L3Descriptor) -> Option<(u16, u16)> {
    let off = desc.l4_offset();
    if frame.len() < off + 4 {
        return None;
    }
    let sport = u16::from_be_bytes([frame[off], frame[off + 1]]);
    let dport = u16::from_be_bytes([frame[off + 2], frame[off + 3]]);
    Some((sport, dport))
}

/// Read the TCP flags byte at `l4_offset + 13` (§4.1).
pub fn read_tcp_flags(frame: &[u8], desc: &L3Descriptor) -> Option<u8> {
    let off = desc.l4_offset();
    frame.get(off + 13).copied()
}

/// Read `{type, code}` for an ICMP/ICMPv6 packet at `l4_offset`/`l4_offset + 1`.
pub fn read_icmp_type_code(frame: &[u8], desc: &L3Descriptor) -> Option<(u8, u8)> {
    let off = desc.l4_offset();
    if frame.len() < off + 2 {
        return None;
    }
    Some((frame[off], frame[off + 1]))
}

/// Build the IPv4 flow key from a descriptor + L4 ports (§3).
pub fn flow_key_v4(desc: &L3Descriptor, sport: u16, dport: u16) -> FlowKeyV4 {
    FlowKeyV4::new(
        u32::from_be_bytes(desc.src_v4()),
        u32::from_be_bytes([desc.dst[0], desc.dst[1], desc.dst[2], desc.dst[3]]),
        sport,
        dport,
        desc.l4_proto,
    )
}

/// Build the IPv6 flow key from a descriptor + L4 ports (§3).
pub fn flow_key_v6(desc: &L3Descriptor, sport: u16, dport: u16) -> FlowKeyV6 {
    FlowKeyV6::new(desc.src, desc.dst, sport, dport, desc.l4_proto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::IPPROTO_TCP;

    fn v4_frame(saddr: [u8; 4], daddr: [u8; 4], sport: u16, dport: u16, flags: u8) -> Vec<u8> {
        let mut f = vec![0u8; 64];
        f[12] = 0x08;
        f[13] = 0x00; // ETH_P_IPV4
        f[14] = 0x45; // version 4, IHL 5 (20 bytes)
        f[14 + 9] = IPPROTO_TCP;
        f[14 + 12..14 + 16].copy_from_slice(&saddr);
        f[14 + 16..14 + 20].copy_from_slice(&daddr);
        let l4 = 14 + 20;
        f[l4..l4 + 2].copy_from_slice(&sport.to_be_bytes());
        f[l4 + 2..l4 + 4].copy_from_slice(&dport.to_be_bytes());
        f[l4 + 13] = flags;
        f
    }

    #[test]
    fn unknown_eth_proto_is_not_ip() {
        let mut f = vec![0u8; 64];
        f[12] = 0x12;
        f[13] = 0x34;
        assert_eq!(parse_l3(&f), ParseOutcome::NotIp);
    }

    #[test]
    fn truncated_frame_drops() {
        let f = vec![0u8; 10];
        assert_eq!(parse_l3(&f), ParseOutcome::Truncated);
    }

    #[test]
    fn v4_header_len_from_ihl_nibble() {
        let f = v4_frame([192, 168, 1, 1], [10, 0, 0, 1], 1234, 80, 0);
        match parse_l3(&f) {
            ParseOutcome::Ok(desc) => {
                assert!(desc.is_v4);
                assert_eq!(desc.header_len, 20);
                assert_eq!(desc.l4_proto, IPPROTO_TCP);
                assert_eq!(desc.src_v4(), [192, 168, 1, 1]);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_flow_key_matches_original_fields() {
        let f = v4_frame([198, 51, 100, 1], [203, 0, 113, 9], 51234, 80, 0);
        let desc = match parse_l3(&f) {
            ParseOutcome::Ok(d) => d,
            other => panic!("expected Ok, got {other:?}"),
        };
        let (sport, dport) = read_l4_ports(&f, &desc).unwrap();
        let key = flow_key_v4(&desc, sport, dport);
        assert_eq!(key.saddr, u32::from_be_bytes([198, 51, 100, 1]));
        assert_eq!(key.daddr, u32::from_be_bytes([203, 0, 113, 9]));
        assert_eq!(key.sport, 51234);
        assert_eq!(key.dport, 80);
        assert_eq!(key.proto, IPPROTO_TCP);
    }

    #[test]
    fn v6_extension_header_next_header_used_as_is() {
        let mut f = vec![0u8; 64];
        f[12] = 0x86;
        f[13] = 0xDD;
        f[14 + 6] = 0; // hop-by-hop extension header number, not walked
        match parse_l3(&f) {
            ParseOutcome::Ok(desc) => {
                assert!(desc.is_v6);
                assert_eq!(desc.l4_proto, 0);
                assert_eq!(desc.header_len, 40);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }
}
