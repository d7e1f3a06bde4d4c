use crate::network::Uid;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetformError {
    #[error("uid={0} already taken")]
    DuplicateIdentifier(Uid),

    #[error("node {0} is not part of the network")]
    NodeNotFound(Uid),

    #[error("self-loop on node {0} is not a valid link")]
    SelfLoop(Uid),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

pub type Result<T> = std::result::Result<T, NetformError>;
