//! Ratchet state (§4.D): a root key plus the two chain stores for one
//! generation, with deterministic sending/receiving assignment (§4.E.3).
//!
//! This is the teacher's "state separation" cut down to the spec's shape:
//! `dl_crypto::ratchet::RatchetSession` bundled root key + one send chain +
//! one recv chain directly as fields; here the two chains are symmetric
//! (`chain_a`/`chain_b`) and which one sends is a pure function of the two
//! parties' public ECDH encodings, not a fixed role.

use crate::chain::ChainStore;
use crate::kdf::derive_ratchet_secrets;
use crate::primitives::{Point, RootKey, SharedSecret};

/// Which chain is currently used for sending.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    ASends,
    BSends,
}

pub struct Ratchet {
    pub root_key: RootKey,
    pub chain_a: ChainStore,
    pub chain_b: ChainStore,
}

impl Ratchet {
    /// Zero root and two zero-key chains at id=0.
    pub fn new() -> Self {
        Ratchet {
            root_key: RootKey::zero(),
            chain_a: ChainStore::new(),
            chain_b: ChainStore::new(),
        }
    }

    /// `rekey`: overwrite root and both chain heads from a freshly mixed
    /// shared secret. Replaces `self` wholesale so the caller's drop of the
    /// old value zeroizes the old chain-key material.
    pub fn rekey(shared: &SharedSecret) -> Self {
        let (root_key, chain_a_key, chain_b_key) = derive_ratchet_secrets(shared);
        Ratchet {
            root_key,
            chain_a: ChainStore::seeded(chain_a_key),
            chain_b: ChainStore::seeded(chain_b_key),
        }
    }
}

impl Default for Ratchet {
    fn default() -> Self {
        Self::new()
    }
}

/// §4.E.3: deterministic sending/receiving assignment by numeric comparison
/// of the two parties' ECDH public encodings. Equality is impossible under
/// honest curves and is a hard error for the caller to surface.
pub fn role_for(our_pub: &Point, their_pub: &Point) -> Option<Role> {
    let ours = our_pub.to_bytes();
    let theirs = their_pub.to_bytes();
    match ours.cmp(&theirs) {
        std::cmp::Ordering::Greater => Some(Role::ASends),
        std::cmp::Ordering::Less => Some(Role::BSends),
        std::cmp::Ordering::Equal => None,
    }
}

impl Ratchet {
    pub fn sending(&mut self, role: Role) -> &mut ChainStore {
        match role {
            Role::ASends => &mut self.chain_a,
            Role::BSends => &mut self.chain_b,
        }
    }

    pub fn receiving(&mut self, role: Role) -> &mut ChainStore {
        match role {
            Role::ASends => &mut self.chain_b,
            Role::BSends => &mut self.chain_a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rekey_produces_distinct_chains() {
        let shared = SharedSecret([5u8; 64]);
        let ratchet = Ratchet::rekey(&shared);
        assert_ne!(
            ratchet.chain_a.last().key.as_bytes(),
            ratchet.chain_b.last().key.as_bytes()
        );
    }

    #[test]
    fn role_for_is_antisymmetric() {
        let a = Point::generator();
        let b = a.mul(&crate::primitives::Scalar::from_bytes(&{
            let mut bytes = [0u8; 56];
            bytes[0] = 2;
            bytes
        }).unwrap());
        let role_ab = role_for(&a, &b);
        let role_ba = role_for(&b, &a);
        assert_ne!(role_ab, role_ba);
    }
}
