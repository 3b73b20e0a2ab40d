//! Shared helpers for the basalt benchmark suite.

/// Generates a unique shared-memory path for a benchmark, keyed by tag
/// and process id so parallel runs do not collide.
pub fn temp_shm_path(tag: &str) -> String {
    format!("/tmp/basalt_{}_{}", tag, std::process::id())
}

/// Deterministic payload of `len` bytes.
pub fn make_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i & 0xFF) as u8).collect()
}
