//! Call-site fingerprints.
//!
//! A fingerprint is the first 8 hex characters of an xxh64 digest over a
//! function name and the textual rendering of each argument. Equal inputs
//! always produce equal fingerprints, so textually identical nested calls
//! share one temp series.

use xxhash_rust::xxh64::xxh64;

/// Separator between hashed parts so that `f("ab", "c")` and `f("a", "bc")`
/// do not collide.
const PART_SEPARATOR: u8 = 0x1f;

/// Compute the 8-hex-character fingerprint of a call site.
pub fn fingerprint<S: AsRef<str>>(function: &str, args: &[S]) -> String {
    let mut bytes = Vec::with_capacity(function.len() + args.len() * 8);
    bytes.extend_from_slice(function.as_bytes());
    for arg in args {
        bytes.push(PART_SEPARATOR);
        bytes.extend_from_slice(arg.as_ref().as_bytes());
    }
    let digest = xxh64(&bytes, 0);
    format!("{:08x}", digest >> 32)
}
