use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtoError {
    #[error("malformed wire data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
