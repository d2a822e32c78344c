//! Canonical serialization for deterministic fingerprints.
//!
//! Derived tables are fingerprinted so a result can be tied to the exact log
//! and parameters that produced it.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Maps in hashed data are `BTreeMap`
//! - Floats are quantized to `i64` before hashing

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Floats are multiplied by this and rounded before hashing.
pub const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Serialize a value to canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("canonical serialization of plain data failed")
}

/// Canonical xxh64 of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Canonical hash as a 16-digit hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Quantize a float for hashing. NaN maps to `i64::MIN`.
pub fn quantize(value: f64) -> i64 {
    if value.is_nan() {
        i64::MIN
    } else {
        (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
    }
}
