//! Monotonic clock access (§3 — "now" in the rate limiters and flow tables).

use aya_ebpf::helpers::bpf_ktime_get_ns;

#[inline(always)]
pub fn now_ns() -> u64 {
    unsafe { bpf_ktime_get_ns() }
}
