//! Tail-call helper shared by every stage (§2, §6).
//!
//! A `bpf_tail_call` either transfers control away for good (this function
//! never returns on that path) or fails and falls through. Per §7, a failed
//! or out-of-range jump-table index is equivalent to PASS — so the fallback
//! after a failed tail call is always `XDP_PASS`, never an error verdict.

use aya_ebpf::{bindings::xdp_action, programs::XdpContext};

use crate::maps::jmp_table;

#[inline(always)]
pub fn tail_call_or_pass(ctx: &XdpContext, index: u32) -> u32 {
    let _ = jmp_table.tail_call(ctx, index);
    xdp_action::XDP_PASS
}
