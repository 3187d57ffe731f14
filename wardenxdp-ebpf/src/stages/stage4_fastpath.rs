//! S4 — flow fastpath (§4.6): per-flow timestamp cache. A fresh UDP hit is
//! settled here and there (token bucket); a fresh TCP hit tails to the state
//! stage for SYN rate limiting; a miss falls through to the deep-inspector
//! gate.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::{flow_key_v4, flow_key_v6, ParseOutcome};
use wardenxdp_common::rate::token_bucket_step;
use wardenxdp_common::{
    RateKey, IDLE_THRESHOLD_TCP_NS, IDLE_THRESHOLD_UDP_NS, IPPROTO_TCP, IPPROTO_UDP,
    PATH_STAT_FAST, PATH_STAT_SLOW, STAGE_GATE, STAGE_STATE, TCP_FLAG_FIN_RST_MASK,
};

use crate::dispatch::tail_call_or_pass;
use crate::time::now_ns;
use crate::{maps, parse, stats};

#[xdp]
pub fn stage4_fastpath(ctx: XdpContext) -> u32 {
    try_stage4(&ctx)
}

fn try_stage4(ctx: &XdpContext) -> u32 {
    let desc = match parse::parse_l3(ctx) {
        ParseOutcome::Ok(d) => d,
        ParseOutcome::NotIp => return xdp_action::XDP_PASS,
        ParseOutcome::Truncated => return xdp_action::XDP_DROP,
    };

    // ICMP/ICMPv6 already admitted at the ACL stage: always PASS here (§4.6).
    if desc.l4_proto != IPPROTO_TCP && desc.l4_proto != IPPROTO_UDP {
        return xdp_action::XDP_PASS;
    }

    let Some((sport, dport)) = parse::read_l4_ports(ctx, &desc) else {
        return xdp_action::XDP_DROP;
    };
    let is_tcp = desc.l4_proto == IPPROTO_TCP;
    let now = now_ns();

    if is_tcp {
        if let Some(flags) = parse::read_tcp_flags(ctx, &desc) {
            if flags & TCP_FLAG_FIN_RST_MASK != 0 {
                delete_tcp_flow_entry(&desc, sport, dport);
            }
        }
    }

    let fresh_hit = lookup_fresh_hit(&desc, sport, dport, is_tcp, now);

    if fresh_hit {
        stats::increment(&maps::path_stats, PATH_STAT_FAST);
        if is_tcp {
            tail_call_or_pass(ctx, STAGE_STATE)
        } else {
            apply_udp_token_bucket(&desc)
        }
    } else {
        stats::increment(&maps::path_stats, PATH_STAT_SLOW);
        tail_call_or_pass(ctx, STAGE_GATE)
    }
}

fn delete_tcp_flow_entry(desc: &wardenxdp_common::parse::L3Descriptor, sport: u16, dport: u16) {
    if desc.is_v4 {
        let key = flow_key_v4(desc, sport, dport);
        let _ = unsafe { maps::tcp_flow.remove(&key) };
    } else {
        let key = flow_key_v6(desc, sport, dport);
        let _ = unsafe { maps::tcp6_flow.remove(&key) };
    }
}

fn lookup_fresh_hit(
    desc: &wardenxdp_common::parse::L3Descriptor,
    sport: u16,
    dport: u16,
    is_tcp: bool,
    now: u64,
) -> bool {
    let idle = if is_tcp { IDLE_THRESHOLD_TCP_NS } else { IDLE_THRESHOLD_UDP_NS };

    let last_seen = if desc.is_v4 {
        let key = flow_key_v4(desc, sport, dport);
        if is_tcp {
            unsafe { maps::tcp_flow.get(&key) }.copied()
        } else {
            unsafe { maps::udp_flow.get(&key) }.copied()
        }
    } else {
        let key = flow_key_v6(desc, sport, dport);
        if is_tcp {
            unsafe { maps::tcp6_flow.get(&key) }.copied()
        } else {
            unsafe { maps::udp6_flow.get(&key) }.copied()
        }
    };

    match last_seen {
        Some(ts) => now.saturating_sub(ts) <= idle,
        None => false,
    }
}

fn apply_udp_token_bucket(desc: &wardenxdp_common::parse::L3Descriptor) -> u32 {
    let rate_key = if desc.is_v4 { RateKey::v4(desc.src_v4()) } else { RateKey::v6(desc.src) };
    let cfg = unsafe { maps::rate_limit_cfg.get(0) }.copied().unwrap_or_default();
    let mut state = unsafe { maps::udp_rl.get(&rate_key) }.copied().unwrap_or_default();

    let dropped = token_bucket_step(&mut state, &cfg, now_ns());
    let _ = unsafe { maps::udp_rl.insert(&rate_key, &state, 0) };

    if dropped {
        xdp_action::XDP_DROP
    } else {
        xdp_action::XDP_PASS
    }
}
