//! SHAKE-256 domain-tagged KDF, SHA3-512 hashing, and hash-to-scalar.
//!
//! This is the one module where the new crate departs from the teacher's
//! literal crate choice (`blake3`/`sha2`): the wire protocol's KDF and
//! hash-to-scalar are specified in terms of SHA-3, not BLAKE3 or SHA-2. The
//! module split itself (`hash` + `kdf`) still follows the teacher's shape.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Digest, Sha3_512, Shake256};

use crate::primitives::Scalar;

/// `SHAKE-256(domain_tag ∥ input, n)`.
pub fn shake_kdf(domain_tag: u8, input: &[u8], out: &mut [u8]) {
    let mut reader = Shake256::default()
        .chain([domain_tag])
        .chain(input)
        .finalize_xof();
    reader.read(out);
}

/// A 64-byte domain-tagged digest, the protocol's generic `H`.
pub fn hash(domain_tag: u8, input: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    shake_kdf(domain_tag, input, &mut out);
    out
}

/// `H("OTR4" ∥ input)` via SHA3-512, reduced into the scalar field by
/// rejection sampling: the low 56 bytes of the digest are tried as a
/// canonical little-endian scalar, and the digest is re-hashed with an
/// incrementing counter until one is accepted. Mirrors the spec's "reduced
/// ... rejects values >= group order" contract without silently wrapping.
pub fn hash_to_scalar(input: &[u8]) -> Scalar {
    let mut counter: u8 = 0;
    loop {
        let mut hasher = Sha3_512::new();
        Digest::update(&mut hasher, b"OTR4");
        Digest::update(&mut hasher, input);
        Digest::update(&mut hasher, [counter]);
        let digest = hasher.finalize();
        if let Ok(scalar) = Scalar::from_bytes(&digest[..56]) {
            return scalar;
        }
        counter = counter.wrapping_add(1);
    }
}

/// `HS(tag ∥ p0 ∥ p1 ∥ …)`: the Schnorr-proof flavor of hash-to-scalar used
/// throughout the SMP proof engine, where the preimage is a single domain
/// byte followed by one or more point encodings.
pub fn hash_to_scalar_tagged(tag: u8, parts: &[&[u8]]) -> Scalar {
    let mut buf = Vec::with_capacity(1 + parts.iter().map(|p| p.len()).sum::<usize>());
    buf.push(tag);
    for part in parts {
        buf.extend_from_slice(part);
    }
    hash_to_scalar(&buf)
}

/// `H(prefix ∥ input) -> 64 bytes`, for domain tags longer than one byte
/// (the SMP common secret's `"OTR4-SMP-v1"` prefix).
pub fn hash_with_prefix(prefix: &[u8], input: &[u8], out: &mut [u8]) {
    let mut reader = Shake256::default()
        .chain(prefix)
        .chain(input)
        .finalize_xof();
    reader.read(out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kdf_domain_tags_are_distinct() {
        let shared = [0u8; 64];
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        let mut c = [0u8; 64];
        shake_kdf(0x01, &shared, &mut a);
        shake_kdf(0x02, &shared, &mut b);
        shake_kdf(0x03, &shared, &mut c);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn hash_to_scalar_is_deterministic() {
        let a = hash_to_scalar(b"the-answer");
        let b = hash_to_scalar(b"the-answer");
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}
