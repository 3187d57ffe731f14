use std::path::PathBuf;
use std::process::Command;

/// Compile the BPF kernel program (`wardenxdp-ebpf`) using `cargo build` for
/// the `bpfel-unknown-none` target.
///
/// The resulting ELF binary is embedded into the userspace binary via
/// `aya::include_bytes_aligned!` in `probe.rs`.
///
/// Requirements: a nightly toolchain with the `rust-src` component, pinned by
/// `wardenxdp-ebpf/rust-toolchain.toml`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let kernel_dir = manifest_dir.parent().ok_or("could not find workspace root")?.join("wardenxdp-ebpf");

    println!("cargo:rerun-if-changed={}", kernel_dir.join("src").display());
    println!("cargo:rerun-if-changed={}", kernel_dir.join("Cargo.toml").display());

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let bpf_target_dir = out_dir.join("bpf-target");

    // Build-script cargo invocations inherit RUSTC/RUSTUP_TOOLCHAIN pointing at
    // the *current* (stable) toolchain; remove them so rustup falls back to the
    // nightly channel pinned by wardenxdp-ebpf/rust-toolchain.toml.
    let status = Command::new("cargo")
        .args(["build", "--release", "--target", "bpfel-unknown-none", "-Z", "build-std=core"])
        .env("CARGO_TARGET_DIR", &bpf_target_dir)
        .env_remove("RUSTC")
        .env_remove("RUSTDOC")
        .env_remove("RUSTUP_TOOLCHAIN")
        .env_remove("RUSTC_WORKSPACE_WRAPPER")
        .env_remove("RUSTC_WRAPPER")
        .current_dir(&kernel_dir)
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => {
            return Err(format!(
                "cargo build of wardenxdp-ebpf failed (exit {:?}).\n\
                Ensure a nightly toolchain with rust-src is installed:\n\
                  rustup toolchain install nightly\n\
                  rustup component add rust-src --toolchain nightly",
                s.code()
            )
            .into());
        }
        Err(e) => return Err(format!("failed to run cargo: {e}").into()),
    }

    let bpf_bin = bpf_target_dir.join("bpfel-unknown-none/release/wardenxdp-ebpf");
    if !bpf_bin.exists() {
        return Err(format!("BPF binary not found at {}", bpf_bin.display()).into());
    }

    let out_file = out_dir.join("wardenxdp.bpf.o");
    std::fs::copy(&bpf_bin, &out_file)?;
    println!("cargo:rustc-env=WARDENXDP_BPF_OBJ={}", out_file.display());
    Ok(())
}
