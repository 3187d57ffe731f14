//! S7 — state stage (§4.9): TCP SYN rate limiting and UDP token-bucket
//! shaping, keyed per `{is_v6, src_addr}`. This is the terminal stage; it
//! always returns a verdict, never a tail call.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::ParseOutcome;
use wardenxdp_common::rate::{syn_limiter_step, token_bucket_step};
use wardenxdp_common::{RateKey, IPPROTO_TCP, IPPROTO_UDP, TCP_FLAG_ACK, TCP_FLAG_SYN};

use crate::time::now_ns;
use crate::{maps, parse};

#[xdp]
pub fn stage7_state(ctx: XdpContext) -> u32 {
    try_stage7(&ctx)
}

fn try_stage7(ctx: &XdpContext) -> u32 {
    let desc = match parse::parse_l3(ctx) {
        ParseOutcome::Ok(d) => d,
        ParseOutcome::NotIp => return xdp_action::XDP_PASS,
        ParseOutcome::Truncated => return xdp_action::XDP_DROP,
    };

    let rate_key = if desc.is_v4 { RateKey::v4(desc.src_v4()) } else { RateKey::v6(desc.src) };
    let now = now_ns();

    let tcp_drop = if desc.l4_proto == IPPROTO_TCP {
        match parse::read_tcp_flags(ctx, &desc) {
            Some(flags) if flags & TCP_FLAG_SYN != 0 && flags & TCP_FLAG_ACK == 0 => {
                let mut state = unsafe { maps::tcp_rate.get(&rate_key) }.copied().unwrap_or_default();
                let drop = syn_limiter_step(&mut state, now);
                let _ = unsafe { maps::tcp_rate.insert(&rate_key, &state, 0) };
                drop
            }
            Some(_) => false,
            None => return xdp_action::XDP_DROP,
        }
    } else {
        false
    };

    let udp_drop = if desc.l4_proto == IPPROTO_UDP {
        let cfg = unsafe { maps::rate_limit_cfg.get(0) }.copied().unwrap_or_default();
        let mut state = unsafe { maps::udp_rl.get(&rate_key) }.copied().unwrap_or_default();
        let drop = token_bucket_step(&mut state, &cfg, now);
        let _ = unsafe { maps::udp_rl.insert(&rate_key, &state, 0) };
        drop
    } else {
        false
    };

    if desc.l4_proto != IPPROTO_TCP && desc.l4_proto != IPPROTO_UDP {
        return xdp_action::XDP_PASS;
    }

    if tcp_drop || udp_drop {
        xdp_action::XDP_DROP
    } else {
        xdp_action::XDP_PASS
    }
}
