use crate::value::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StandInError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("behavior raised: {0}")]
    Raised(Value),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
