//! otr4_crypto — OTRv4 cryptographic primitives: the Double Ratchet key
//! manager and the Socialist Millionaires' Protocol, both over Edwards-448.
//!
//! # Design principles
//! - NO custom curve arithmetic; `ed448-goldilocks` provides the group.
//! - Zeroize all secret material on drop.
//! - Public APIs return opaque newtypes to prevent accidental misuse.
//!
//! # Module layout
//! - `primitives`   — scalar/point/MPI wrappers and zeroizing secret newtypes
//! - `hash`         — SHAKE-256/SHA3-512 domain-tagged hashing and hash-to-scalar
//! - `kdf`          — ratchet and per-message key derivation
//! - `chain`        — append-only chain-link store with bounded catch-up
//! - `ratchet`      — one ratchet generation: root key + two chain stores
//! - `dh3072`       — RFC 3526 MODP group 15 "brace key" contribution
//! - `fingerprint`  — identity fingerprints and session SSID
//! - `key_manager`  — the Double Ratchet driver (§4.E)
//! - `smp`          — the Socialist Millionaires' Protocol
//! - `error`        — unified error type

pub mod chain;
pub mod dh3072;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod kdf;
pub mod key_manager;
pub mod primitives;
pub mod ratchet;
pub mod smp;

pub use error::Otr4Error;
