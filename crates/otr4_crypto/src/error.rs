use thiserror::Error;

/// Single typed error surfaced at the `otr4_crypto` boundary.
///
/// `#[non_exhaustive]` because this is a published library boundary: a future
/// added variant must not be a breaking change for embedders who match on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Otr4Error {
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("ratchet index {got} is out of range of current {current}")]
    OutOfRatchet { current: u32, got: u32 },

    #[error("operation not valid in current SMP state: {0}")]
    StateViolation(String),

    #[error("zero-knowledge proof verification failed: {0}")]
    ProofInvalid(String),

    #[error("SMP verdict failure: secrets did not match")]
    VerdictFailure,

    #[error("underlying primitive failed: {0}")]
    PrimitiveFailure(String),

    #[error("allocation failed: {0}")]
    AllocFailure(String),
}

pub type Result<T> = std::result::Result<T, Otr4Error>;
