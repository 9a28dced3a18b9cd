//! The snake game as a reinforcement-learning environment
//!
//! [`GridWorld`] owns the simulation, [`VisionEncoder`] compresses it into an [`Observation`],
//! [`RewardPolicy`] scores each [`Event`] and [`SnakeEnv`] ties the three together behind
//! the [`Environment`] trait.

mod reward;
mod vision;
mod world;

pub use reward::RewardPolicy;
pub use vision::{Observation, Ray, Sight, VisionEncoder};
pub use world::{
    Direction, Event, GridWorld, Item, ItemKind, Position, WorldConfig, INITIAL_LENGTH,
};

use strum::VariantArray;

use crate::{
    env::{Environment, Report, Transition},
    Result,
};

/// A [`GridWorld`] seen through a [`VisionEncoder`] and scored by a [`RewardPolicy`]
///
/// Every direction is always offered as an action; reversals are corrected by the world
/// rather than pruned here.
pub struct SnakeEnv {
    world: GridWorld,
    rewards: RewardPolicy,
    pub report: Report,
}

impl SnakeEnv {
    pub fn new(world: GridWorld, rewards: RewardPolicy) -> Self {
        Self {
            world,
            rewards,
            report: Report::new(vec!["score", "reward", "steps"]),
        }
    }

    /// Read-only view of the simulation, e.g. for rendering
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn rewards(&self) -> &RewardPolicy {
        &self.rewards
    }

    /// Beneficial items eaten minus harmful items eaten since the reset
    pub fn score(&self) -> i64 {
        self.world.len() as i64 - INITIAL_LENGTH as i64
    }

    fn transition(&self, reward: f32) -> Transition<Self> {
        Transition {
            observation: VisionEncoder::encode(&self.world),
            reward,
            actions: self.actions(),
            done: self.world.is_terminal(),
        }
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut GridWorld {
        &mut self.world
    }
}

impl Environment for SnakeEnv {
    type State = Observation;
    type Action = Direction;

    fn action_space() -> Vec<Self::Action> {
        Direction::VARIANTS.to_vec()
    }

    fn actions(&self) -> Vec<Self::Action> {
        Self::action_space()
    }

    fn is_active(&self) -> bool {
        !self.world.is_terminal() && !self.world.is_halted()
    }

    fn reset(&mut self) -> Result<Transition<Self>> {
        self.world.reset()?;
        Ok(self.transition(0.0))
    }

    fn step(&mut self, action: Self::Action) -> Result<Transition<Self>> {
        let event = self.world.step(action)?;
        let reward = self.rewards.reward(event);

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report.entry("reward").and_modify(|x| *x += reward as f64);
        if event == Event::BeneficialEaten {
            self.report.entry("score").and_modify(|x| *x += 1.0);
        }

        Ok(self.transition(reward))
    }
}
