//! Kernel-side frame parsing (§4.1).
//!
//! This mirrors `wardenxdp_common::parse` field-for-field — same
//! `L3Descriptor`, same offsets — but reads through bounds-checked raw
//! pointers (`ptr_at`) instead of slice indexing, because the BPF verifier
//! tracks `PTR_TO_PACKET` provenance through pointer arithmetic, not through
//! a `&[u8]` built from `ctx.data()`/`ctx.data_end()`. Keep the two in lockstep.

use aya_ebpf::programs::XdpContext;
use wardenxdp_common::parse::{L3Descriptor, ParseOutcome};
use wardenxdp_common::{ETH_P_IPV4, ETH_P_IPV6};

use crate::headers::{ptr_at, EthHdr, Ipv4Hdr, Ipv6Hdr};

const ETH_HDR_LEN: usize = 14;

pub fn parse_l3(ctx: &XdpContext) -> ParseOutcome {
    let eth = match unsafe { ptr_at::<EthHdr>(ctx, 0) } {
        Some(p) => p,
        None => return ParseOutcome::Truncated,
    };
    let proto = u16::from_be(unsafe { (*eth).h_proto });

    match proto {
        ETH_P_IPV4 => parse_v4(ctx),
        ETH_P_IPV6 => parse_v6(ctx),
        _ => ParseOutcome::NotIp,
    }
}

fn parse_v4(ctx: &XdpContext) -> ParseOutcome {
    let ip = match unsafe { ptr_at::<Ipv4Hdr>(ctx, ETH_HDR_LEN) } {
        Some(p) => p,
        None => return ParseOutcome::Truncated,
    };
    let header_len = usize::from(unsafe { (*ip).ihl() }) << 2;
    if header_len < core::mem::size_of::<Ipv4Hdr>() {
        return ParseOutcome::Truncated;
    }
    // Re-validate bounds against the (possibly larger, with options) header length.
    if unsafe { ptr_at::<u8>(ctx, ETH_HDR_LEN + header_len - 1) }.is_none() {
        return ParseOutcome::Truncated;
    }

    let l4_proto = unsafe { (*ip).protocol };
    let saddr = unsafe { (*ip).saddr }.to_be_bytes();
    let daddr = unsafe { (*ip).daddr }.to_be_bytes();
    let mut src = [0u8; 16];
    let mut dst = [0u8; 16];
    src[..4].copy_from_slice(&saddr);
    dst[..4].copy_from_slice(&daddr);

    ParseOutcome::Ok(L3Descriptor { is_v4: true, is_v6: false, header_len, l4_proto, src, dst })
}

fn parse_v6(ctx: &XdpContext) -> ParseOutcome {
    let ip = match unsafe { ptr_at::<Ipv6Hdr>(ctx, ETH_HDR_LEN) } {
        Some(p) => p,
        None => return ParseOutcome::Truncated,
    };
    let l4_proto = unsafe { (*ip).next_header };
    let src = unsafe { (*ip).saddr };
    let dst = unsafe { (*ip).daddr };

    ParseOutcome::Ok(L3Descriptor {
        is_v4: false,
        is_v6: true,
        header_len: core::mem::size_of::<Ipv6Hdr>(),
        l4_proto,
        src,
        dst,
    })
}

/// Read `{sport, dport}` at `l4_offset`/`l4_offset + 2` (§4.1).
pub fn read_l4_ports(ctx: &XdpContext, desc: &L3Descriptor) -> Option<(u16, u16)> {
    let off = ETH_HDR_LEN + desc.header_len;
    let sport_ptr = unsafe { ptr_at::<u16>(ctx, off)? };
    let dport_ptr = unsafe { ptr_at::<u16>(ctx, off + 2)? };
    Some((u16::from_be(unsafe { *sport_ptr }), u16::from_be(unsafe { *dport_ptr })))
}

/// Read the TCP flags byte at `l4_offset + 13` (§4.1).
pub fn read_tcp_flags(ctx: &XdpContext, desc: &L3Descriptor) -> Option<u8> {
    let off = ETH_HDR_LEN + desc.header_len + 13;
    let p = unsafe { ptr_at::<u8>(ctx, off)? };
    Some(unsafe { *p })
}

/// Read `{type, code}` for an ICMP/ICMPv6 packet (§4.1).
pub fn read_icmp_type_code(ctx: &XdpContext, desc: &L3Descriptor) -> Option<(u8, u8)> {
    let off = ETH_HDR_LEN + desc.header_len;
    let type_ptr = unsafe { ptr_at::<u8>(ctx, off)? };
    let code_ptr = unsafe { ptr_at::<u8>(ctx, off + 1)? };
    Some((unsafe { *type_ptr }, unsafe { *code_ptr }))
}
