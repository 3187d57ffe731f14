//! Read-side access to the per-CPU counters (§5, §8): sum across CPUs since
//! each core maintains its own slot.

use crate::probe::Pipeline;
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct PathStats {
    pub fast_hits: u64,
    pub slow_hits: u64,
}

pub fn path_stats(pipeline: &Pipeline) -> Result<PathStats> {
    let map = pipeline.path_stats()?;
    let fast_hits = sum_percpu(&map, wardenxdp_common::PATH_STAT_FAST)?;
    let slow_hits = sum_percpu(&map, wardenxdp_common::PATH_STAT_SLOW)?;
    Ok(PathStats { fast_hits, slow_hits })
}

pub fn whitelist_misses(pipeline: &Pipeline) -> Result<u64> {
    let map = pipeline.whitelist_miss()?;
    sum_percpu(&map, 0)
}

fn sum_percpu(
    map: &aya::maps::PerCpuArray<&aya::maps::MapData, u64>,
    index: u32,
) -> Result<u64> {
    let values = map.get(&index, 0)?;
    Ok(values.iter().sum())
}
