//! S0 — whitelist (§4.2): immediate PASS for known-good sources, otherwise
//! bump the miss counter and either drop an un-whitelisted ICMP echo or
//! tail-call into the panic stage.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::ParseOutcome;
use wardenxdp_common::stage::is_icmp_echo;
use wardenxdp_common::{FAMILY_V4, FAMILY_V6, IPPROTO_ICMP, IPPROTO_ICMPV6, STAGE_PANIC};
use wardenxdp_common::{WhitelistKey};

use crate::dispatch::tail_call_or_pass;
use crate::{maps, parse, stats};

#[xdp]
pub fn stage0_whitelist(ctx: XdpContext) -> u32 {
    try_stage0(&ctx)
}

fn try_stage0(ctx: &XdpContext) -> u32 {
    let desc = match parse::parse_l3(ctx) {
        ParseOutcome::Ok(d) => d,
        ParseOutcome::NotIp => return xdp_action::XDP_PASS,
        ParseOutcome::Truncated => return xdp_action::XDP_DROP,
    };

    let family = if desc.is_v4 { FAMILY_V4 } else { FAMILY_V6 };
    let key = if desc.is_v4 { WhitelistKey::v4(desc.src_v4()) } else { WhitelistKey::v6(desc.src) };

    if unsafe { maps::whitelist.get(&key) }.is_some() {
        return xdp_action::XDP_PASS;
    }

    stats::increment(&maps::whitelist_miss, 0);

    let is_icmp = desc.l4_proto == IPPROTO_ICMP || desc.l4_proto == IPPROTO_ICMPV6;
    if is_icmp {
        if let Some((icmp_type, _code)) = parse::read_icmp_type_code(ctx, &desc) {
            if is_icmp_echo(family, icmp_type) {
                return xdp_action::XDP_DROP;
            }
        }
    }

    tail_call_or_pass(ctx, STAGE_PANIC)
}
