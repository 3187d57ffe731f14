//! The shared data-plane tables (§6), defined once and used by every stage.

use aya_ebpf::macros::map;
use aya_ebpf::maps::{Array, HashMap, LruHashMap, PerCpuArray, ProgramArray};

use wardenxdp_common::{
    BypassRecordV4, BypassRecordV6, FlowKeyV4, FlowKeyV6, IcmpAllowKey, RateKey, RateLimitConfig,
    TcpRateState, UdpTokenBucket, WhitelistKey, BLACKLIST_CAPACITY, BYPASS_TABLE_CAPACITY,
    FLOW_TABLE_UDP6_CAPACITY, FLOW_TABLE_V4_CAPACITY, FLOW_TABLE_V6_CAPACITY, JMP_TABLE_SIZE,
    WHITELIST_CAPACITY,
};

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static whitelist: HashMap<WhitelistKey, u8> = HashMap::with_max_entries(WHITELIST_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static panic_flag: Array<u8> = Array::with_max_entries(1, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static global_bypass: Array<u8> = Array::with_max_entries(1, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static acl_ports: Array<u64> = Array::with_max_entries(1, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static icmp_allow: HashMap<IcmpAllowKey, u8> = HashMap::with_max_entries(256, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static ipv4_drop: HashMap<u32, u8> = HashMap::with_max_entries(BLACKLIST_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static ipv6_drop: HashMap<[u8; 16], u8> = HashMap::with_max_entries(BLACKLIST_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static tcp_flow: LruHashMap<FlowKeyV4, u64> =
    LruHashMap::with_max_entries(FLOW_TABLE_V4_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static udp_flow: LruHashMap<FlowKeyV4, u64> =
    LruHashMap::with_max_entries(FLOW_TABLE_V4_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static tcp6_flow: LruHashMap<FlowKeyV6, u64> =
    LruHashMap::with_max_entries(FLOW_TABLE_V6_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static udp6_flow: LruHashMap<FlowKeyV6, u64> =
    LruHashMap::with_max_entries(FLOW_TABLE_UDP6_CAPACITY, 0);

/// Bypass table written by the external deep-inspector (§4.7); one slot per
/// CPU, indexed by the 14-bit flow-key hash.
#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static flow_table_v4: PerCpuArray<BypassRecordV4> =
    PerCpuArray::with_max_entries(BYPASS_TABLE_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static flow_table_v6: PerCpuArray<BypassRecordV6> =
    PerCpuArray::with_max_entries(BYPASS_TABLE_CAPACITY, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static rate_limit_cfg: Array<RateLimitConfig> = Array::with_max_entries(1, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static tcp_rate: HashMap<RateKey, TcpRateState> = HashMap::with_max_entries(128, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static udp_rl: HashMap<RateKey, UdpTokenBucket> = HashMap::with_max_entries(128, 0);

/// `path_stats[0]` = fast-path hits, `path_stats[1]` = slow-path hits (§2, §8).
#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static path_stats: PerCpuArray<u64> = PerCpuArray::with_max_entries(2, 0);

/// Whitelist-miss counter (§4.2, §5); not part of `path_stats` since it's
/// incremented by a different stage and observed independently.
#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static whitelist_miss: PerCpuArray<u64> = PerCpuArray::with_max_entries(1, 0);

#[map(pin = "byname")]
#[allow(non_upper_case_globals)]
pub static jmp_table: ProgramArray = ProgramArray::with_max_entries(JMP_TABLE_SIZE, 0);
