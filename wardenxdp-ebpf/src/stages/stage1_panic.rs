//! S1 — panic (§4.3): constant-time emergency shutoff.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};

use wardenxdp_common::STAGE_ACL;

use crate::dispatch::tail_call_or_pass;
use crate::maps;

#[xdp]
pub fn stage1_panic(ctx: XdpContext) -> u32 {
    let flag = unsafe { maps::panic_flag.get(0) }.copied().unwrap_or(0);
    if flag & 1 == 1 {
        return xdp_action::XDP_DROP;
    }
    tail_call_or_pass(&ctx, STAGE_ACL)
}
