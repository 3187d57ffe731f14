//! Per-CPU counter helpers (§5, §8): relaxed, contention-free increments.

use aya_ebpf::maps::PerCpuArray;

#[inline(always)]
pub fn increment(map: &PerCpuArray<u64>, index: u32) {
    if let Some(ptr) = map.get_ptr_mut(index) {
        unsafe {
            *ptr = (*ptr).wrapping_add(1);
        }
    }
}
