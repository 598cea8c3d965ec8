use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Coordination service unreachable at startup. Fatal, no retry.
    #[error("cannot reach coordination service: {0}")]
    Connect(String),

    /// Ephemeral node creation failed; the participant has no identity.
    #[error("election node registration failed: {0}")]
    Registration(String),

    /// Service-class failure on an established session.
    #[error("coordination service unavailable: {0}")]
    Unavailable(String),

    /// The requested path does not exist.
    #[error("node not found: {0}")]
    NotFound(String),

    /// This participant's own node is missing from a fresh sibling
    /// snapshot. Signals session loss; no rank computed afterwards can be
    /// trusted.
    #[error("own node {0} missing from sibling snapshot")]
    SelfNotFound(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}
