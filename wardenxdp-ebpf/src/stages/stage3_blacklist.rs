//! S3 — blacklist (§4.5): drop explicitly blacklisted or private/reserved
//! sources. On drop, also evict the matching deep-inspector bypass slot so a
//! freshly-blacklisted source can't keep riding the fast path.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::{flow_key_v4, flow_key_v6, ParseOutcome};
use wardenxdp_common::ranges::{is_private_v4, is_reserved_v6};
use wardenxdp_common::stage::{bypass_hash_v4, bypass_hash_v6};
use wardenxdp_common::{BypassRecordV4, BypassRecordV6, IPPROTO_TCP, IPPROTO_UDP, STAGE_FASTPATH};

use crate::dispatch::tail_call_or_pass;
use crate::{maps, parse};

#[xdp]
pub fn stage3_blacklist(ctx: XdpContext) -> u32 {
    try_stage3(&ctx)
}

fn try_stage3(ctx: &XdpContext) -> u32 {
    let desc = match parse::parse_l3(ctx) {
        ParseOutcome::Ok(d) => d,
        ParseOutcome::NotIp => return xdp_action::XDP_PASS,
        ParseOutcome::Truncated => return xdp_action::XDP_DROP,
    };

    let blacklisted = if desc.is_v4 {
        let addr = u32::from_be_bytes(desc.src_v4());
        unsafe { maps::ipv4_drop.get(&addr) }.is_some() || is_private_v4(desc.src_v4())
    } else {
        unsafe { maps::ipv6_drop.get(&desc.src) }.is_some() || is_reserved_v6(&desc.src)
    };

    if !blacklisted {
        return tail_call_or_pass(ctx, STAGE_FASTPATH);
    }

    evict_bypass_slot(ctx, &desc);
    xdp_action::XDP_DROP
}

/// Best-effort eviction: ports are only meaningful for TCP/UDP, so other
/// protocols have no bypass slot to clear.
fn evict_bypass_slot(ctx: &XdpContext, desc: &wardenxdp_common::parse::L3Descriptor) {
    if desc.l4_proto != IPPROTO_TCP && desc.l4_proto != IPPROTO_UDP {
        return;
    }
    let Some((sport, dport)) = parse::read_l4_ports(ctx, desc) else { return };

    if desc.is_v4 {
        let key = flow_key_v4(desc, sport, dport);
        let idx = u32::from(bypass_hash_v4(&key));
        if let Some(ptr) = maps::flow_table_v4.get_ptr_mut(idx) {
            unsafe { *ptr = BypassRecordV4::default() };
        }
    } else {
        let key = flow_key_v6(desc, sport, dport);
        let idx = u32::from(bypass_hash_v6(&key));
        if let Some(ptr) = maps::flow_table_v6.get_ptr_mut(idx) {
            unsafe { *ptr = BypassRecordV6::default() };
        }
    }
}
