//! otr4_proto — wire serialization, TLV envelopes and DAKE header parsing
//! for the OTRv4 core.
//!
//! # Modules
//! - `wire`  — fixed-width ints, `data`, `mpi`, point, scalar encodings (§4.B)
//! - `tlv`   — TLV envelope and SMP message wire layout (§4.I, §6.1)
//! - `dake`  — opaque DAKE identity-message header parser (§6.2)
//! - `error` — unified wire-parsing error type

pub mod dake;
pub mod error;
pub mod tlv;
pub mod wire;

pub use dake::IdentityMessageHeader;
pub use error::ProtoError;
pub use tlv::{Tlv, TlvType};
