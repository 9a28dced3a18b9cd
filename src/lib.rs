//! A grid snake simulation and a tabular Q-learning agent that learns to play it

/// Implemented RL algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Error taxonomy shared by every component
pub mod error;

/// Exploration policies
pub mod exploration;

/// Snake environment
pub mod gym;

/// Experience replay
pub mod memory;

mod util;

pub use error::{Error, Result};
