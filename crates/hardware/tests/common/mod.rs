
use simcache_core::common::{Addr, Packet};

/// Block size used throughout the tests.
pub const BLOCK: usize = 64;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Returns the `n`-th block address.
pub const fn blk(n: u64) -> Addr {
    n * BLOCK as u64
}

/// A whole-block read response filled with `byte`, as memory would return it.
pub fn block_response(addr: Addr, byte: u8) -> Packet {
    let mut pkt = Packet::read(1, addr, BLOCK);
    pkt.data_mut().fill(byte);
    pkt.make_response();
    pkt
}
