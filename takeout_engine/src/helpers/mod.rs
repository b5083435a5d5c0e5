//! Small free-standing helpers shared across the engine.
use std::sync::atomic::{AtomicU32, Ordering};

use blake2::{Blake2b512, Digest};
use chrono::Utc;

static ORDER_SEQ: AtomicU32 = AtomicU32::new(0);

/// Generates a new order number: the current epoch milliseconds with a three-digit rolling
/// suffix, so two orders submitted in the same millisecond still get distinct numbers.
pub fn next_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed) % 1000;
    format!("{millis}{seq:03}")
}

/// Hashes an employee password for storage. One-way; login re-hashes and compares.
pub fn hash_password(password: &str) -> String {
    let digest = Blake2b512::digest(password.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
