use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{kind} identifier must not be empty")]
    EmptyIdentifier { kind: &'static str },
}

pub type Result<T> = std::result::Result<T, ModelError>;
