//! Attaches the pipeline to a network interface and wires the jump table.
//!
//! Every stage after the whitelist is loaded (but never itself attached) so
//! its file descriptor can be placed into the shared `jmp_table`
//! `ProgramArray` at the index the kernel side tail-calls into (§2, §6).

use std::path::Path;

use aya::maps::{Array, HashMap, MapData, PerCpuArray, ProgramArray};
use aya::programs::{Xdp, XdpFlags};
use aya::{Ebpf, EbpfLoader};
use tracing::info;

use wardenxdp_common::{
    STAGE_ACL, STAGE_BLACKLIST, STAGE_DISPATCH, STAGE_FASTPATH, STAGE_GATE, STAGE_PANIC,
    STAGE_STATE,
};

use crate::{LoaderError, Result};

/// Raw bytes of the compiled kernel object, embedded at compile time.
/// `include_bytes_aligned!` ensures the 8-byte alignment `aya`'s ELF parser requires.
static PIPELINE_BPF_BYTES: &[u8] =
    aya::include_bytes_aligned!(concat!(env!("OUT_DIR"), "/wardenxdp.bpf.o"));

const STAGE_ORDER: &[(u32, &str)] = &[
    (STAGE_PANIC, "stage1_panic"),
    (STAGE_ACL, "stage2_acl"),
    (STAGE_BLACKLIST, "stage3_blacklist"),
    (STAGE_FASTPATH, "stage4_fastpath"),
    (STAGE_GATE, "stage5_gate"),
    (STAGE_DISPATCH, "stage6_dispatch"),
    (STAGE_STATE, "stage7_state"),
];

/// Owns the loaded kernel object and the attached whitelist program. Dropping
/// it detaches the pipeline.
pub struct Pipeline {
    ebpf: Ebpf,
    interface: String,
}

/// Default bpffs directory every table is pinned under (§6). Pinning lets
/// `wardenxdp-cli` open the running pipeline's tables without reloading or
/// re-attaching any program.
pub const DEFAULT_PIN_PATH: &str = "/sys/fs/bpf/wardenxdp";

impl Pipeline {
    /// Load the kernel object and attach `stage0_whitelist` to `interface`,
    /// pinning every table under `DEFAULT_PIN_PATH`.
    pub fn attach(interface: &str) -> Result<Self> {
        Self::attach_with_pin_path(interface, DEFAULT_PIN_PATH)
    }

    /// Same as [`Pipeline::attach`], pinning tables under `pin_path` instead
    /// of the default bpffs directory.
    pub fn attach_with_pin_path(interface: &str, pin_path: impl AsRef<Path>) -> Result<Self> {
        // Lift the locked-memory limit so BPF maps can be created without
        // depending on `memlock: unlimited` in the deployment environment.
        #[cfg(target_os = "linux")]
        unsafe {
            let rlim = libc::rlimit { rlim_cur: libc::RLIM_INFINITY, rlim_max: libc::RLIM_INFINITY };
            let _ = libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim);
        }

        std::fs::create_dir_all(pin_path.as_ref())
            .map_err(|e| LoaderError::Config(format!("failed to create pin directory: {e}")))?;

        let mut ebpf = EbpfLoader::new()
            .map_pin_path(pin_path.as_ref())
            .load(PIPELINE_BPF_BYTES)
            .map_err(LoaderError::Load)?;

        {
            let mut jmp_table: ProgramArray<&mut MapData> = ebpf
                .map_mut("jmp_table")
                .ok_or(LoaderError::MapNotFound("jmp_table"))?
                .try_into()
                .map_err(|e| LoaderError::MapType("jmp_table", e))?;

            for &(index, name) in STAGE_ORDER {
                let prog: &mut Xdp = ebpf
                    .program_mut(name)
                    .ok_or(LoaderError::ProgramNotFound(name))?
                    .try_into()
                    .map_err(LoaderError::ProgramType)?;
                prog.load().map_err(LoaderError::ProgramLoad)?;
                let fd = prog.fd().map_err(LoaderError::ProgramLoad)?;
                jmp_table.set(index, &fd, 0).map_err(|e| LoaderError::TailCallSlot(index, e.to_string()))?;
            }
        }

        let whitelist: &mut Xdp = ebpf
            .program_mut("stage0_whitelist")
            .ok_or(LoaderError::ProgramNotFound("stage0_whitelist"))?
            .try_into()
            .map_err(LoaderError::ProgramType)?;
        whitelist.load().map_err(LoaderError::ProgramLoad)?;
        whitelist.attach(interface, XdpFlags::default()).map_err(LoaderError::Attach)?;

        info!(interface, stages = STAGE_ORDER.len() + 1, "XDP pipeline attached");

        Ok(Self { ebpf, interface: interface.to_string() })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn whitelist(&mut self) -> Result<HashMap<&mut MapData, wardenxdp_common::WhitelistKey, u8>> {
        self.ebpf
            .map_mut("whitelist")
            .ok_or(LoaderError::MapNotFound("whitelist"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("whitelist", e))
    }

    pub fn ipv4_drop(&mut self) -> Result<HashMap<&mut MapData, u32, u8>> {
        self.ebpf
            .map_mut("ipv4_drop")
            .ok_or(LoaderError::MapNotFound("ipv4_drop"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("ipv4_drop", e))
    }

    pub fn ipv6_drop(&mut self) -> Result<HashMap<&mut MapData, [u8; 16], u8>> {
        self.ebpf
            .map_mut("ipv6_drop")
            .ok_or(LoaderError::MapNotFound("ipv6_drop"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("ipv6_drop", e))
    }

    pub fn icmp_allow(&mut self) -> Result<HashMap<&mut MapData, wardenxdp_common::IcmpAllowKey, u8>> {
        self.ebpf
            .map_mut("icmp_allow")
            .ok_or(LoaderError::MapNotFound("icmp_allow"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("icmp_allow", e))
    }

    pub fn acl_ports(&mut self) -> Result<Array<&mut MapData, u64>> {
        self.ebpf
            .map_mut("acl_ports")
            .ok_or(LoaderError::MapNotFound("acl_ports"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("acl_ports", e))
    }

    pub fn panic_flag(&mut self) -> Result<Array<&mut MapData, u8>> {
        self.ebpf
            .map_mut("panic_flag")
            .ok_or(LoaderError::MapNotFound("panic_flag"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("panic_flag", e))
    }

    pub fn global_bypass(&mut self) -> Result<Array<&mut MapData, u8>> {
        self.ebpf
            .map_mut("global_bypass")
            .ok_or(LoaderError::MapNotFound("global_bypass"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("global_bypass", e))
    }

    pub fn rate_limit_cfg(
        &mut self,
    ) -> Result<Array<&mut MapData, wardenxdp_common::RateLimitConfig>> {
        self.ebpf
            .map_mut("rate_limit_cfg")
            .ok_or(LoaderError::MapNotFound("rate_limit_cfg"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("rate_limit_cfg", e))
    }

    pub fn path_stats(&self) -> Result<PerCpuArray<&MapData, u64>> {
        self.ebpf
            .map("path_stats")
            .ok_or(LoaderError::MapNotFound("path_stats"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("path_stats", e))
    }

    pub fn whitelist_miss(&self) -> Result<PerCpuArray<&MapData, u64>> {
        self.ebpf
            .map("whitelist_miss")
            .ok_or(LoaderError::MapNotFound("whitelist_miss"))?
            .try_into()
            .map_err(|e| LoaderError::MapType("whitelist_miss", e))
    }
}

/// Opens a running pipeline's pinned tables directly, without loading or
/// attaching any program. This is how `wardenxdp-cli` reaches the whitelist
/// and blacklist while the daemon keeps the pipeline attached (§6).
pub struct ControlMaps {
    pin_path: std::path::PathBuf,
}

impl ControlMaps {
    pub fn open(pin_path: impl AsRef<Path>) -> Self {
        Self { pin_path: pin_path.as_ref().to_path_buf() }
    }

    pub fn open_default() -> Self {
        Self::open(DEFAULT_PIN_PATH)
    }

    fn pinned(&self, name: &'static str) -> Result<MapData> {
        MapData::from_pin(self.pin_path.join(name))
            .map_err(|e| LoaderError::Config(format!("failed to open pinned map '{name}': {e}")))
    }

    pub fn whitelist(&self) -> Result<HashMap<MapData, wardenxdp_common::WhitelistKey, u8>> {
        self.pinned("whitelist")?.try_into().map_err(|e| LoaderError::MapType("whitelist", e))
    }

    pub fn ipv4_drop(&self) -> Result<HashMap<MapData, u32, u8>> {
        self.pinned("ipv4_drop")?.try_into().map_err(|e| LoaderError::MapType("ipv4_drop", e))
    }

    pub fn ipv6_drop(&self) -> Result<HashMap<MapData, [u8; 16], u8>> {
        self.pinned("ipv6_drop")?.try_into().map_err(|e| LoaderError::MapType("ipv6_drop", e))
    }

    pub fn panic_flag(&self) -> Result<Array<MapData, u8>> {
        self.pinned("panic_flag")?.try_into().map_err(|e| LoaderError::MapType("panic_flag", e))
    }

    pub fn acl_ports(&self) -> Result<Array<MapData, u64>> {
        self.pinned("acl_ports")?.try_into().map_err(|e| LoaderError::MapType("acl_ports", e))
    }
}
