use thiserror::Error;

/// Errors that can occur in the bridge core.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request body was not a decodable game-state push.
    #[error("invalid game state payload: {0}")]
    Payload(String),

    /// The rich-presence IPC connection failed or rejected an update.
    #[error("presence ipc failure: {0}")]
    Presence(String),

    /// Shared state became unusable (a holder of the lock panicked).
    #[error("internal state error: {0}")]
    Internal(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
