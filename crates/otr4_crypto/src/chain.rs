//! Append-only chain-link store (§4.C).
//!
//! Re-architected from the original C's singly-linked list with pointer
//! mutation into a flat `Vec<ChainLink>` indexed by id, following the same
//! move the teacher already made in `ratchet.rs`, which flattened a
//! pointer-chasing skipped-key chain into a `HashMap`-indexed store.

use crate::error::{Otr4Error, Result};
use crate::kdf::extend_chain_key;
use crate::primitives::ChainKey;

/// Bound on in-order catch-up within one ratchet generation. The original
/// C `rebuild_chain_keys_up_to` has no such ceiling; this restores the
/// spec's "configurable skip limit" (§5 Ordering) concretely, following the
/// teacher's own `RatchetSession::MAX_SKIP` constant.
pub const MAX_SKIP: u32 = 256;

pub struct ChainLink {
    pub id: u32,
    pub key: ChainKey,
}

/// An ordered, append-only sequence of per-message chain keys.
pub struct ChainStore {
    links: Vec<ChainLink>,
}

impl ChainStore {
    /// A single link at id=0 with an all-zero key.
    pub fn new() -> Self {
        ChainStore {
            links: vec![ChainLink {
                id: 0,
                key: ChainKey::zero(),
            }],
        }
    }

    pub fn seeded(key: ChainKey) -> Self {
        ChainStore {
            links: vec![ChainLink { id: 0, key }],
        }
    }

    pub fn last(&self) -> &ChainLink {
        self.links.last().expect("store always has at least one link")
    }

    /// Only the current head is ever live; any other id names a link whose
    /// key has already been zeroized by `extend()`, so it is `None` even
    /// though the (now-inert) entry still sits in `links`.
    pub fn by_id(&self, k: u32) -> Option<&ChainLink> {
        let last = self.last();
        if last.id == k {
            Some(last)
        } else {
            None
        }
    }

    /// `next.key = H(cur.key)`, `next.id = cur.id + 1`. Zeroizes the
    /// previous head's key before replacing the vector entry.
    pub fn extend(&mut self) {
        let next_key = extend_chain_key(&self.last().key);
        let next_id = self.last().id + 1;
        if let Some(last) = self.links.last_mut() {
            last.key = ChainKey::zero();
        }
        self.links.push(ChainLink {
            id: next_id,
            key: next_key,
        });
    }

    /// Extend repeatedly until `last.id == k`. `spec.md` §9: the original
    /// silently accepted `k < last.id`; here that is `OutOfRatchet`.
    pub fn extend_to(&mut self, k: u32) -> Result<()> {
        let floor = self.last().id;
        if k < floor {
            return Err(Otr4Error::OutOfRatchet {
                current: floor,
                got: k,
            });
        }
        if k - floor > MAX_SKIP {
            return Err(Otr4Error::AllocFailure(format!(
                "catch-up of {} exceeds MAX_SKIP={MAX_SKIP}",
                k - floor
            )));
        }
        while self.last().id < k {
            self.extend();
        }
        Ok(())
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_derives_next_id_and_key() {
        let mut store = ChainStore::seeded(ChainKey([9u8; 64]));
        let first_key = store.last().key.clone();
        store.extend();
        assert_eq!(store.last().id, 1);
        assert_ne!(store.last().key.as_bytes(), first_key.as_bytes());
    }

    #[test]
    fn earlier_links_are_zeroized_after_extension() {
        let mut store = ChainStore::seeded(ChainKey([3u8; 64]));
        store.extend();
        store.extend();
        assert!(store.by_id(0).is_none());
        assert!(store.by_id(1).is_none());
        assert!(!store.by_id(2).unwrap().key.is_zero());
    }

    #[test]
    fn extend_to_rejects_going_backwards() {
        let mut store = ChainStore::seeded(ChainKey([3u8; 64]));
        store.extend_to(5).unwrap();
        assert!(matches!(
            store.extend_to(2),
            Err(Otr4Error::OutOfRatchet { .. })
        ));
    }

    #[test]
    fn extend_to_rejects_beyond_max_skip() {
        let mut store = ChainStore::seeded(ChainKey([3u8; 64]));
        assert!(matches!(
            store.extend_to(MAX_SKIP + 1),
            Err(Otr4Error::AllocFailure(_))
        ));
    }
}
