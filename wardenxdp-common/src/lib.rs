//! Table key/value layouts and pure decision logic shared between the XDP
//! program (`wardenxdp-ebpf`) and the userspace loader/CLI.
//!
//! `no_std` so it compiles for `bpfel-unknown-none` as well as the host.
//! Everything in here is either a `#[repr(C)]` POD table layout or a
//! pure function operating on plain values — no map access, no I/O. That
//! split is what lets the stage logic be unit tested on the host while the
//! real `#[map]` statics live only in `wardenxdp-ebpf`.
#![cfg_attr(not(test), no_std)]

pub mod consts;
pub mod keys;
pub mod parse;
pub mod ranges;
pub mod rate;
pub mod stage;

pub use consts::*;
pub use keys::*;
