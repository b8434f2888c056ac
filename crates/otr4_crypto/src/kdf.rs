//! Domain-tagged key derivation built on [`crate::hash`].
//!
//! Three disjoint single-byte domain tags separate the ratchet's root/chain
//! derivation (§4.D) from the per-message encryption/MAC derivation (§4.E.4);
//! a fourth untagged step advances a chain link to the next.

use crate::hash::shake_kdf;
use crate::primitives::{BraceKey, ChainKey, RootKey, SharedSecret};

const TAG_ROOT_KEY: u8 = 0x01;
const TAG_CHAIN_A: u8 = 0x02;
const TAG_CHAIN_B: u8 = 0x03;
const TAG_ENC_KEY: u8 = 0x01;
const TAG_MAC_KEY: u8 = 0x02;

/// `rekey`: derive `(root_key, chain_a.key, chain_b.key)` from a freshly
/// mixed shared secret. The three tags are disjoint single bytes.
pub fn derive_ratchet_secrets(shared: &SharedSecret) -> (RootKey, ChainKey, ChainKey) {
    let mut root = [0u8; 64];
    let mut chain_a = [0u8; 64];
    let mut chain_b = [0u8; 64];
    shake_kdf(TAG_ROOT_KEY, shared.as_bytes(), &mut root);
    shake_kdf(TAG_CHAIN_A, shared.as_bytes(), &mut chain_a);
    shake_kdf(TAG_CHAIN_B, shared.as_bytes(), &mut chain_b);
    (RootKey(root), ChainKey(chain_a), ChainKey(chain_b))
}

/// §4.E.4: `enc_key <- KDF(0x01, ck, 32)`, `mac_key <- KDF(0x02, ck, 64)`.
pub fn derive_message_keys(ck: &ChainKey) -> ([u8; 32], [u8; 64]) {
    let mut enc_key = [0u8; 32];
    let mut mac_key = [0u8; 64];
    shake_kdf(TAG_ENC_KEY, ck.as_bytes(), &mut enc_key);
    shake_kdf(TAG_MAC_KEY, ck.as_bytes(), &mut mac_key);
    (enc_key, mac_key)
}

/// Chain-link extension: `next.key = H(cur.key)`, untagged — the protocol's
/// symmetric ratchet step.
pub fn extend_chain_key(ck: &ChainKey) -> ChainKey {
    let mut next = [0u8; 64];
    shake_kdf(0x00, ck.as_bytes(), &mut next);
    ChainKey(next)
}

/// §4.E.2 step 2: rehash the brace key when no fresh DH-3072 contribution
/// was generated this generation.
pub fn rehash_brace_key(brace: &BraceKey) -> BraceKey {
    let mut next = [0u8; 64];
    shake_kdf(0x00, brace.as_bytes(), &mut next);
    let mut out = [0u8; 32];
    out.copy_from_slice(&next[..32]);
    BraceKey(out)
}

/// §4.E.2 step 2: derive the brace key from a fresh DH-3072 shared value.
pub fn brace_key_from_dh(dh_shared: &[u8]) -> BraceKey {
    let mut digest = [0u8; 64];
    shake_kdf(0x00, dh_shared, &mut digest);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    BraceKey(out)
}

/// §4.E.2 step 3: mix the ECDH shared point and the brace key into the
/// generation's shared secret.
pub fn derive_shared_secret(k_ecdh: &[u8], brace_key: &BraceKey) -> SharedSecret {
    let mut input = Vec::with_capacity(k_ecdh.len() + 32);
    input.extend_from_slice(k_ecdh);
    input.extend_from_slice(brace_key.as_bytes());
    let mut out = [0u8; 64];
    shake_kdf(0x00, &input, &mut out);
    SharedSecret(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratchet_secrets_are_pairwise_distinct() {
        let shared = SharedSecret([0u8; 64]);
        let (root, chain_a, chain_b) = derive_ratchet_secrets(&shared);
        assert_ne!(root.0, chain_a.0);
        assert_ne!(chain_a.0, chain_b.0);
        assert_ne!(root.0, chain_b.0);
    }

    #[test]
    fn message_key_derivation_is_deterministic() {
        let ck = ChainKey([7u8; 64]);
        let (enc1, mac1) = derive_message_keys(&ck);
        let (enc2, mac2) = derive_message_keys(&ck);
        assert_eq!(enc1, enc2);
        assert_eq!(mac1, mac2);
    }
}
