//! The Double Ratchet engine (§4.E) — the ~30%-share core component.
//!
//! Grounded directly on `dl_crypto::ratchet::RatchetSession`: the same
//! "derive-then-zeroize" `encrypt_step`/`decrypt_step` shape and the same
//! `MAX_SKIP`-bounded catch-up, re-purposed to OTRv4's three-secret
//! (ECDH + periodic DH-3072 + chain) mixing schedule instead of the
//! teacher's plain X25519 ratchet.

use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::dh3072;
use crate::error::{Otr4Error, Result};
use crate::fingerprint::derive_ssid;
use crate::kdf::{brace_key_from_dh, derive_message_keys, derive_shared_secret, rehash_brace_key};
use crate::primitives::{BraceKey, Mpi, Point, Scalar};
use crate::ratchet::{role_for, Ratchet, Role};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionRole {
    Initiator,
    Responder,
}

pub struct KeyManager {
    our_ecdh_priv: Option<Scalar>,
    our_ecdh_pub: Point,
    their_ecdh: Option<Point>,

    our_dh_priv: Option<Mpi>,
    our_dh_pub: Mpi,
    their_dh: Option<Mpi>,

    i: u32,
    j: u32,
    current: Option<Ratchet>,
    brace_key: BraceKey,
    ssid: [u8; 8],
    old_mac_keys: Vec<[u8; 64]>,

    session_label: Option<String>,
}

impl KeyManager {
    /// Allocate fresh interior state: counters at zero, a fresh ephemeral
    /// ECDH keypair, no ratchet yet.
    pub fn init() -> Self {
        let our_ecdh_priv = Scalar::random(&mut OsRng);
        let our_ecdh_pub = our_ecdh_priv.mul_base();
        KeyManager {
            our_ecdh_priv: Some(our_ecdh_priv),
            our_ecdh_pub,
            their_ecdh: None,
            our_dh_priv: None,
            our_dh_pub: Mpi::zero(),
            their_dh: None,
            i: 0,
            j: 0,
            current: None,
            brace_key: BraceKey::zero(),
            ssid: [0u8; 8],
            old_mac_keys: Vec::new(),
            session_label: None,
        }
    }

    pub fn with_session_label(mut self, label: impl Into<String>) -> Self {
        self.session_label = Some(label.into());
        self
    }

    pub fn our_ecdh_public(&self) -> &Point {
        &self.our_ecdh_pub
    }

    pub fn ssid(&self) -> &[u8; 8] {
        &self.ssid
    }

    pub fn ratchet_index(&self) -> u32 {
        self.i
    }

    fn label(&self) -> &str {
        self.session_label.as_deref().unwrap_or("unlabeled")
    }

    /// Record the peer's most recently observed ECDH/DH contribution.
    /// Called by the embedder before `next_receiving_keys` whenever an
    /// inbound message advertises new public values, mirroring
    /// `key_manager_set_their_keys` in the original C.
    pub fn set_their_keys(&mut self, their_ecdh: Point, their_dh: Option<Mpi>) {
        self.their_ecdh = Some(their_ecdh);
        if let Some(dh) = their_dh {
            self.their_dh = Some(dh);
        }
    }

    /// Called once by the DAKE with the first ECDH shared point and DH-3072
    /// shared value it computed; installs the first ratchet and derives the
    /// SSID.
    pub fn seed(
        &mut self,
        seed_ecdh_shared: &Point,
        seed_dh_shared: &Mpi,
        their_ecdh: Point,
        role: SessionRole,
    ) -> Result<()> {
        self.their_ecdh = Some(their_ecdh);
        // i = 0, so the brace key is always freshly derived from a DH-3072
        // shared value on the seeding generation. `seed_dh_shared` already
        // IS that shared value, computed externally by the DAKE.
        let brace_key = brace_key_from_dh(&seed_dh_shared.to_bytes_be());
        let shared = derive_shared_secret(&seed_ecdh_shared.to_bytes(), &brace_key);
        self.brace_key = brace_key;
        self.ssid = derive_ssid(&shared);
        self.current = Some(Ratchet::rekey(&shared));
        if matches!(role, SessionRole::Initiator) {
            tracing::debug!(session = self.label(), "seeded key manager as initiator");
        } else {
            tracing::debug!(session = self.label(), "seeded key manager as responder");
        }
        Ok(())
    }

    /// §4.E.2: mix a fresh shared secret and install a new ratchet.
    fn install_new_ratchet(&mut self) -> Result<()> {
        let their_ecdh = self
            .their_ecdh
            .as_ref()
            .ok_or_else(|| Otr4Error::StateViolation("no peer ECDH key on record".into()))?;
        let our_priv = self
            .our_ecdh_priv
            .as_ref()
            .ok_or_else(|| Otr4Error::StateViolation("our ECDH private key was zeroized".into()))?;

        if self.our_ecdh_pub.to_bytes() == their_ecdh.to_bytes() {
            return Err(Otr4Error::PrimitiveFailure(
                "our ECDH public key equals the peer's".into(),
            ));
        }

        let k_ecdh = their_ecdh.mul(our_priv);

        let brace_key = if self.i % 3 == 0 {
            let their_dh = self
                .their_dh
                .as_ref()
                .ok_or_else(|| Otr4Error::StateViolation("no peer DH-3072 key on record".into()))?;
            let our_dh_priv = self.our_dh_priv.as_ref().ok_or_else(|| {
                Otr4Error::StateViolation("no DH-3072 keypair generated for this generation".into())
            })?;
            let mut k_dh = dh3072::shared_secret(our_dh_priv, their_dh);
            let brace = brace_key_from_dh(&k_dh);
            k_dh.zeroize();
            brace
        } else {
            rehash_brace_key(&self.brace_key)
        };

        let mut k_ecdh_bytes = k_ecdh.to_bytes();
        let shared = derive_shared_secret(&k_ecdh_bytes, &brace_key);
        k_ecdh_bytes.zeroize();

        if self.current.is_none() {
            self.ssid = derive_ssid(&shared);
        }

        self.brace_key = brace_key;
        self.current = Some(Ratchet::rekey(&shared));
        tracing::debug!(session = self.label(), i = self.i, "installed new ratchet");
        Ok(())
    }

    fn current_role(&self) -> Result<Role> {
        let their_ecdh = self
            .their_ecdh
            .as_ref()
            .ok_or_else(|| Otr4Error::StateViolation("no peer ECDH key on record".into()))?;
        role_for(&self.our_ecdh_pub, their_ecdh)
            .ok_or_else(|| Otr4Error::PrimitiveFailure("ECDH public keys are equal".into()))
    }

    /// §4.E.5: prepare the outbound message at position `(i, j)`.
    pub fn next_sending_keys(&mut self) -> Result<([u8; 32], [u8; 64], u32, u32)> {
        if self.j == 0 {
            self.i += 1;
            let fresh_priv = Scalar::random(&mut OsRng);
            self.our_ecdh_pub = fresh_priv.mul_base();
            self.our_ecdh_priv = Some(fresh_priv);
            if self.i % 3 == 0 {
                let (priv_key, pub_key) = dh3072::generate_keypair(&mut OsRng);
                self.our_dh_priv = Some(priv_key);
                self.our_dh_pub = pub_key;
            }
            self.install_new_ratchet()?;
            self.j = 0;
        } else {
            let role = self.current_role()?;
            let ratchet = self
                .current
                .as_mut()
                .ok_or_else(|| Otr4Error::StateViolation("ratchet not seeded".into()))?;
            ratchet.sending(role).extend();
        }

        let role = self.current_role()?;
        let ratchet = self
            .current
            .as_mut()
            .ok_or_else(|| Otr4Error::StateViolation("ratchet not seeded".into()))?;
        let ck = ratchet.sending(role).last().key.clone();
        let (enc_key, mac_key) = derive_message_keys(&ck);
        let (i, j) = (self.i, self.j);
        self.j += 1;
        tracing::trace!(session = self.label(), i, j, "derived sending keys");
        Ok((enc_key, mac_key, i, j))
    }

    /// §4.E.6: derive keys for an inbound message at position `(i', j')`,
    /// performing catch-up as needed.
    pub fn next_receiving_keys(&mut self, i_prime: u32, j_prime: u32) -> Result<([u8; 32], [u8; 64])> {
        if i_prime == self.i + 1 {
            self.ensure_on_ratchet()?;
        } else if i_prime != self.i {
            return Err(Otr4Error::OutOfRatchet {
                current: self.i,
                got: i_prime,
            });
        }

        let role = self.current_role()?;
        let ratchet = self
            .current
            .as_mut()
            .ok_or_else(|| Otr4Error::StateViolation("ratchet not seeded".into()))?;
        ratchet.receiving(role).extend_to(j_prime)?;
        let ck = ratchet.receiving(role).by_id(j_prime).expect("just extended to this id").key.clone();
        let (enc_key, mac_key) = derive_message_keys(&ck);
        tracing::trace!(session = self.label(), i = i_prime, j = j_prime, "derived receiving keys");
        Ok((enc_key, mac_key))
    }

    /// `key_manager_ensure_on_ratchet`: roll our side onto the peer's new
    /// ratchet generation before catching up the receiving chain.
    fn ensure_on_ratchet(&mut self) -> Result<()> {
        if self.j == 0 {
            return Ok(());
        }
        self.i += 1;
        self.install_new_ratchet()?;
        if let Some(priv_key) = self.our_ecdh_priv.take() {
            drop(priv_key);
        }
        if self.i % 3 == 0 {
            self.our_dh_priv = None;
        }
        self.j = 0;
        Ok(())
    }

    /// Enqueue a MAC key that authenticated a received message but has not
    /// yet been published.
    pub fn retire_mac_key(&mut self, mac_key: [u8; 64]) {
        self.old_mac_keys.push(mac_key);
    }

    /// Serialize and empty `old_mac_keys`, oldest first, for attachment to
    /// the next outbound message. Idempotent after empty.
    pub fn flush_retired_mac_keys(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.old_mac_keys.len() * 64);
        for mut key in self.old_mac_keys.drain(..) {
            out.extend_from_slice(&key);
            key.zeroize();
        }
        out
    }

    /// Zeroize all secret material. Consuming `self` triggers the field
    /// drops (`Scalar`/`Mpi`/`BraceKey`/chain keys all zeroize on drop where
    /// applicable); explicit here for the ambiguous non-`Drop` fields.
    pub fn destroy(mut self) {
        self.our_ecdh_priv = None;
        self.our_dh_priv = None;
        for mut key in self.old_mac_keys.drain(..) {
            key.zeroize();
        }
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_pair() -> (KeyManager, KeyManager) {
        let mut alice = KeyManager::init();
        let mut bob = KeyManager::init();

        let shared_ecdh = Point::generator();
        let seed_dh = Mpi::from_bytes_be(&[7u8; 32]);

        alice
            .seed(&shared_ecdh, &seed_dh, bob.our_ecdh_pub.clone(), SessionRole::Initiator)
            .unwrap();
        bob.seed(&shared_ecdh, &seed_dh, alice.our_ecdh_pub.clone(), SessionRole::Responder)
            .unwrap();

        (alice, bob)
    }

    #[test]
    fn ratchet_parity_within_one_generation() {
        let (mut alice, mut bob) = seeded_pair();
        bob.set_their_keys(alice.our_ecdh_pub.clone(), None);

        for _ in 0..3 {
            let (enc_a, mac_a, i, j) = alice.next_sending_keys().unwrap();
            let (enc_b, mac_b) = bob.next_receiving_keys(i, j).unwrap();
            assert_eq!(enc_a, enc_b);
            assert_eq!(mac_a, mac_b);
        }
    }

    #[test]
    fn flush_retired_mac_keys_is_idempotent_after_empty() {
        let mut km = KeyManager::init();
        km.retire_mac_key([1u8; 64]);
        let first = km.flush_retired_mac_keys();
        assert_eq!(first.len(), 64);
        let second = km.flush_retired_mac_keys();
        assert!(second.is_empty());
    }

    #[test]
    fn out_of_ratchet_rejects_distant_generation() {
        let (mut alice, mut bob) = seeded_pair();
        bob.set_their_keys(alice.our_ecdh_pub.clone(), None);
        let err = bob.next_receiving_keys(alice.i + 5, 0).unwrap_err();
        assert!(matches!(err, Otr4Error::OutOfRatchet { .. }));
    }

    #[derive(Clone, Default)]
    struct BufWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for BufWriter {
        type Writer = BufWriter;
        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn ratchet_rotation_emits_tracing_event() {
        let buf = BufWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let (mut alice, mut bob) = seeded_pair();
        bob.set_their_keys(alice.our_ecdh_pub.clone(), None);

        tracing::subscriber::with_default(subscriber, || {
            alice.next_sending_keys().unwrap();
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("installed new ratchet"));
    }
}
