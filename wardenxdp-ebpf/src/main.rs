//! XDP packet-filter pipeline: a jump table of eight tail-called programs
//! (§2). `wardenxdp-loader` attaches `stage0_whitelist` and populates the
//! jump table with the rest in chain order.
#![no_std]
#![no_main]

mod dispatch;
mod headers;
mod maps;
mod parse;
mod stages;
mod stats;
mod time;

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
