//! S5 — deep-inspector gate (§4.7): consult the bypass table the external
//! stream-inspection engine writes to, then the global bypass flag.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::{flow_key_v4, flow_key_v6, ParseOutcome};
use wardenxdp_common::stage::{bypass_hash_v4, bypass_hash_v6};
use wardenxdp_common::{IPPROTO_TCP, IPPROTO_UDP, STAGE_DISPATCH};

use crate::dispatch::tail_call_or_pass;
use crate::{maps, parse};

#[xdp]
pub fn stage5_gate(ctx: XdpContext) -> u32 {
    try_stage5(&ctx)
}

fn try_stage5(ctx: &XdpContext) -> u32 {
    let desc = match parse::parse_l3(ctx) {
        ParseOutcome::Ok(d) => d,
        ParseOutcome::NotIp => return xdp_action::XDP_PASS,
        ParseOutcome::Truncated => return xdp_action::XDP_DROP,
    };

    if desc.l4_proto != IPPROTO_TCP && desc.l4_proto != IPPROTO_UDP {
        return xdp_action::XDP_PASS;
    }
    let Some((sport, dport)) = parse::read_l4_ports(ctx, &desc) else {
        return xdp_action::XDP_DROP;
    };

    let bypassed = if desc.is_v4 {
        let key = flow_key_v4(&desc, sport, dport);
        let idx = u32::from(bypass_hash_v4(&key));
        unsafe { maps::flow_table_v4.get(idx) }.is_some_and(|rec| rec.key == key)
    } else {
        let key = flow_key_v6(&desc, sport, dport);
        let idx = u32::from(bypass_hash_v6(&key));
        unsafe { maps::flow_table_v6.get(idx) }.is_some_and(|rec| rec.key == key)
    };

    if bypassed {
        return xdp_action::XDP_DROP;
    }

    let global_bypass = unsafe { maps::global_bypass.get(0) }.copied().unwrap_or(0);
    if global_bypass != 0 {
        return xdp_action::XDP_PASS;
    }

    tail_call_or_pass(ctx, STAGE_DISPATCH)
}
