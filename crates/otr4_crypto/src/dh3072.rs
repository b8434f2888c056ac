//! DH-3072 modular exponentiation (RFC 3526 MODP group 15), the "brace key"
//! contribution mixed in every third ratchet generation (§4.E.2).
//!
//! §9 design note: the original C initializes a process-wide modulus once.
//! Here the modulus/generator are a lazily-initialized immutable constant
//! (`std::sync::OnceLock`) owned by this module, not global mutable state.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::Num;
use rand::RngCore;

use crate::primitives::Mpi;

const MODP_3072_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC7",
    "4020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F14",
    "374FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B",
    "7EDEE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163",
    "BF0598DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208",
    "552BB9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E",
    "36CE3BE39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF69",
    "55817183995497CEA956AE515D2261898FA051015728E5A8AACAA68FFFFFFFF",
    "FFFFFFFF",
);

const GENERATOR: u64 = 2;

fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| {
        BigUint::from_str_radix(MODP_3072_HEX, 16).expect("MODP-3072 constant is well-formed")
    })
}

/// Generate a fresh DH-3072 keypair: a random exponent and `g^priv mod p`.
pub fn generate_keypair(rng: &mut impl RngCore) -> (Mpi, Mpi) {
    let mut bytes = [0u8; 384];
    rng.fill_bytes(&mut bytes);
    let priv_exp = BigUint::from_bytes_be(&bytes) % modulus();
    let pub_val = BigUint::from(GENERATOR).modpow(&priv_exp, modulus());
    (Mpi(priv_exp), Mpi(pub_val))
}

/// `their_pub ^ our_priv mod p`, the 384-byte DH-3072 shared value.
pub fn shared_secret(our_priv: &Mpi, their_pub: &Mpi) -> Vec<u8> {
    let shared = their_pub.0.modpow(&our_priv.0, modulus());
    let mut bytes = shared.to_bytes_be();
    if bytes.len() < 384 {
        let mut padded = vec![0u8; 384 - bytes.len()];
        padded.append(&mut bytes);
        bytes = padded;
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn shared_secret_agrees_both_directions() {
        let (a_priv, a_pub) = generate_keypair(&mut OsRng);
        let (b_priv, b_pub) = generate_keypair(&mut OsRng);
        let shared_a = shared_secret(&a_priv, &b_pub);
        let shared_b = shared_secret(&b_priv, &a_pub);
        assert_eq!(shared_a, shared_b);
    }
}
