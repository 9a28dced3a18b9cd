use thiserror::Error;

/// Errors raised by the simulation, the environment adapter and the agents
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was invoked in a state where it is not allowed, e.g. stepping a dead snake
    #[error("Invalid transition: {0}")]
    InvalidTransition(&'static str),

    /// The board has no empty cell left to place an item on
    #[error("No empty cell left on the board")]
    CapacityExhausted,

    /// A configuration value was rejected at construction time
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
