use xxhash_rust::xxh64::xxh64;

/// Canonical hash width in hex characters, exposed to callers.
pub const HASH_LEN: u32 = 2;
const RADIX: u64 = 16;
const HASH_MOD: u64 = RADIX.pow(HASH_LEN);

/// Compute a short hex hash of a single line.
///
/// Strips a trailing `\r`, computes xxHash64 seeded with the 1-indexed
/// line number, then keeps the low `HASH_LEN * 4` bits as a fixed-width
/// lowercase hex string. Seeding by line number means identical text on
/// two different lines gets different hashes.
pub fn compute_line_hash(line_no: usize, line: &str) -> String {
    let mut line = line;
    if line.ends_with('\r') {
        line = &line[..line.len() - 1];
    }
    let h = xxh64(line.as_bytes(), line_no as u64) % HASH_MOD;
    format!("{:02x}", h)
}
