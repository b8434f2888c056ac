//! Fingerprints & SSID (§4.H): deterministic identifiers derived from
//! identity keys and the session's first shared secret.

use crate::hash::hash;
use crate::primitives::{Point, SharedSecret};

/// `fingerprint(identity_key) = H(serialized_identity_point)`, truncated to
/// 56 bytes.
pub fn fingerprint(identity_key: &Point) -> [u8; 56] {
    let digest = hash(0x00, &identity_key.to_bytes());
    let mut out = [0u8; 56];
    out.copy_from_slice(&digest[..56]);
    out
}

/// First 8 bytes of `H(first_shared_secret)`.
pub fn derive_ssid(first_shared_secret: &SharedSecret) -> [u8; 8] {
    let digest = hash(0x00, first_shared_secret.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let key = Point::generator();
        assert_eq!(fingerprint(&key), fingerprint(&key));
    }

    #[test]
    fn distinct_points_give_distinct_fingerprints() {
        let g = Point::generator();
        let two_g = g.mul(&crate::primitives::Scalar::from_bytes(&{
            let mut b = [0u8; 56];
            b[0] = 2;
            b
        }).unwrap());
        assert_ne!(fingerprint(&g), fingerprint(&two_g));
    }
}
