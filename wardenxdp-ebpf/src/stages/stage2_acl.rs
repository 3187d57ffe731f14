//! S2 — ACL (§4.4): destination-port + protocol admission, plus
//! allow-listed ICMP. Missing bitmap/table entries are deny-by-default (§7).

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::parse::ParseOutcome;
use wardenxdp_common::stage::acl_port_allowed;
use wardenxdp_common::{
    IcmpAllowKey, FAMILY_V4, FAMILY_V6, IPPROTO_ICMP, IPPROTO_ICMPV6, IPPROTO_TCP, IPPROTO_UDP,
    STAGE_BLACKLIST,
};

use crate::dispatch::tail_call_or_pass;
use crate::{maps, parse};

#[xdp]
pub fn stage2_acl(ctx: XdpContext) -> u32 {
    try_stage2(&ctx)
}

fn try_stage2(ctx: &XdpContext) -> u32 {
    let desc = match parse::parse_l3(ctx) {
        ParseOutcome::Ok(d) => d,
        ParseOutcome::NotIp => return xdp_action::XDP_PASS,
        ParseOutcome::Truncated => return xdp_action::XDP_DROP,
    };
    let family = if desc.is_v4 { FAMILY_V4 } else { FAMILY_V6 };

    let admitted = if desc.l4_proto == IPPROTO_TCP || desc.l4_proto == IPPROTO_UDP {
        match parse::read_l4_ports(ctx, &desc) {
            Some((_sport, dport)) => {
                let bitmap = unsafe { maps::acl_ports.get(0) }.copied().unwrap_or(0);
                acl_port_allowed(bitmap, dport)
            }
            None => return xdp_action::XDP_DROP,
        }
    } else if desc.l4_proto == IPPROTO_ICMP || desc.l4_proto == IPPROTO_ICMPV6 {
        match parse::read_icmp_type_code(ctx, &desc) {
            Some((icmp_type, icmp_code)) => {
                let key = IcmpAllowKey::new(family, icmp_type, icmp_code);
                unsafe { maps::icmp_allow.get(&key) }.is_some()
            }
            None => return xdp_action::XDP_DROP,
        }
    } else {
        false
    };

    if !admitted {
        return xdp_action::XDP_DROP;
    }

    tail_call_or_pass(ctx, STAGE_BLACKLIST)
}
