//! S6 — proto-dispatch (§4.8): refresh the flow-table timestamp for this
//! packet's slot, then hand TCP/UDP off to the state stage.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::{flow_key_v4, flow_key_v6, ParseOutcome};
use wardenxdp_common::{IPPROTO_TCP, IPPROTO_UDP, STAGE_STATE};

use crate::dispatch::tail_call_or_pass;
use crate::time::now_ns;
use crate::{maps, parse};

#[xdp]
pub fn stage6_dispatch(ctx: XdpContext) -> u32 {
    try_stage6(&ctx)
}

fn try_stage6(ctx: &XdpContext) -> u32 {
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
    let now = now_ns();
    let is_tcp = desc.l4_proto == IPPROTO_TCP;

    if desc.is_v4 {
        let key = flow_key_v4(&desc, sport, dport);
        let map = if is_tcp { &maps::tcp_flow } else { &maps::udp_flow };
        let _ = unsafe { map.insert(&key, &now, 0) };
    } else {
        let key = flow_key_v6(&desc, sport, dport);
        let map = if is_tcp { &maps::tcp6_flow } else { &maps::udp6_flow };
        let _ = unsafe { map.insert(&key, &now, 0) };
    }

    tail_call_or_pass(ctx, STAGE_STATE)
}
