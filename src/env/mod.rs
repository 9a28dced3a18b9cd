mod report;

pub use report::Report;

use crate::Result;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Clone;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Clone;

    /// The full, fixed set of actions this environment understands
    ///
    /// Used when replaying stored experiences, where the environment instance is not at hand.
    fn action_space() -> Vec<Self::Action>;

    /// Get the available actions for the current state
    ///
    /// The returned vector should never be empty while the environment is active.
    fn actions(&self) -> Vec<Self::Action>;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Errors** if the environment is already terminal
    fn step(&mut self, action: Self::Action) -> Result<Transition<Self>>;

    /// Reset the environment to an initial state, with zero reward and `done == false`
    fn reset(&mut self) -> Result<Transition<Self>>;
}

/// The outcome of resetting or stepping an [`Environment`]
pub struct Transition<E: Environment + ?Sized> {
    /// The state observed after the transition
    pub observation: E::State,
    /// The reward received for the transition
    pub reward: f32,
    /// The actions available from the new state
    pub actions: Vec<E::Action>,
    /// Whether the new state is terminal
    pub done: bool,
}

impl<E: Environment + ?Sized> Clone for Transition<E> {
    fn clone(&self) -> Self {
        Self {
            observation: self.observation.clone(),
            reward: self.reward,
            actions: self.actions.clone(),
            done: self.done,
        }
    }
}
