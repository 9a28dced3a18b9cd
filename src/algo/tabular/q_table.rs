use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    decay,
    ensure_interval,
    env::Environment,
    exploration::{Choice, EpsilonGreedy},
    memory::{Exp, ReplayMemory},
    Error, Result,
};

use super::Hashable;

/// A table of action values keyed by `(state, action)`
///
/// Reads of unseen pairs return `0.0` without inserting anything, so the table only grows
/// through [`QTable::set`].
#[derive(Debug, Clone, PartialEq)]
pub struct QTable<S: Hashable, A: Hashable> {
    values: HashMap<(S, A), f32>,
}

impl<S: Hashable, A: Hashable> Default for QTable<S, A> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<S: Hashable, A: Hashable> QTable<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: S, action: A) -> f32 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: S, action: A, value: f32) {
        self.values.insert((state, action), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(S, A), &f32)> {
        self.values.iter()
    }

    /// The highest valued action, keeping the first one encountered on ties
    pub fn best(&self, state: S, actions: &[A]) -> Option<A> {
        actions
            .iter()
            .map(|&a| (a, self.get(state, a)))
            .fold(None, |best: Option<(A, f32)>, (a, q)| match best {
                Some((_, best_q)) if best_q >= q => best,
                _ => Some((a, q)),
            })
            .map(|(a, _)| a)
    }

    /// `max_a Q(state, a)`, or `0.0` when there are no actions
    pub fn max_value(&self, state: S, actions: &[A]) -> f32 {
        actions
            .iter()
            .map(|&a| self.get(state, a))
            .reduce(f32::max)
            .unwrap_or(0.0)
    }
}

#[derive(Serialize, Deserialize)]
struct Record<S, A> {
    observation: S,
    action: A,
    value: f64,
}

impl<S, A> QTable<S, A>
where
    S: Hashable + Serialize + DeserializeOwned,
    A: Hashable + Serialize + DeserializeOwned,
{
    /// Serialize every entry as JSON records
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let records = self
            .values
            .iter()
            .map(|(&(observation, action), &value)| Record {
                observation,
                action,
                value: value as f64,
            })
            .collect::<Vec<_>>();
        serde_json::to_writer(writer, &records)?;
        Ok(())
    }

    /// Restore a table written by [`QTable::save`]
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let records: Vec<Record<S, A>> = serde_json::from_reader(reader)?;
        let values = records
            .into_iter()
            .map(|r| ((r.observation, r.action), r.value as f32))
            .collect();
        Ok(Self { values })
    }
}

/// Configuration for the [`QLearningAgent`]
#[derive(Debug, Clone)]
pub struct QLearningAgentConfig {
    /// Epsilon schedule, decayed once per [`QLearningAgent::train`] call
    ///
    /// **Default**: starts at `1.0`, multiplied by `0.995` per training round, floored at `0.01`
    pub exploration: EpsilonGreedy<decay::Multiplicative>,
    /// Learning rate, in `[0, 1]`
    ///
    /// **Default**: `0.1`
    pub alpha: f32,
    /// Discount factor, in `[0, 1]`
    ///
    /// **Default**: `0.99`
    pub gamma: f32,
    /// Maximum number of stored experiences
    ///
    /// **Default**: `10_000`
    pub memory_capacity: usize,
    /// Experiences replayed per training round
    ///
    /// **Default**: `64`
    pub batch_size: usize,
}

impl Default for QLearningAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(
                decay::Multiplicative::new(0.995, 1.0, 0.01).expect("default decay is valid"),
            ),
            alpha: 0.1,
            gamma: 0.99,
            memory_capacity: 10_000,
            batch_size: 64,
        }
    }
}

/// What happened during one episode run by [`QLearningAgent::go`] or [`QLearningAgent::play`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub steps: usize,
    pub total_reward: f32,
    /// `false` if the episode was cut off by the step cap
    pub finished: bool,
}

/// A Q-learning agent with a tabular value function and experience replay
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///     - The state and action types must be [`Hashable`] to be used as Q-table keys
pub struct QLearningAgent<E>
where
    E: Environment,
    E::State: Hashable,
    E::Action: Hashable,
{
    q_table: QTable<E::State, E::Action>,
    memory: ReplayMemory<E>,
    exploration: EpsilonGreedy<decay::Multiplicative>,
    alpha: f32,      // learning rate
    gamma: f32,      // discount factor
    trainings: u32,  // completed training rounds, drives epsilon decay
    episode: u32,    // current episode
    rng: StdRng,
}

impl<E> QLearningAgent<E>
where
    E: Environment,
    E::State: Hashable,
    E::Action: Hashable,
{
    /// Initialize a new agent seeded from system entropy
    ///
    /// **Errors** if `alpha` or `gamma` is not in `[0,1]`, or if the memory cannot hold a batch
    pub fn new(config: QLearningAgentConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Initialize a reproducible agent
    pub fn with_seed(config: QLearningAgentConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: QLearningAgentConfig, rng: StdRng) -> Result<Self> {
        ensure_interval!(config.alpha, 0.0, 1.0);
        ensure_interval!(config.gamma, 0.0, 1.0);
        if config.batch_size == 0 || config.batch_size > config.memory_capacity {
            return Err(Error::Configuration(format!(
                "batch size must be in [1, {}], got {}",
                config.memory_capacity, config.batch_size
            )));
        }
        Ok(Self {
            q_table: QTable::new(),
            memory: ReplayMemory::new(config.memory_capacity, config.batch_size),
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            trainings: 0,
            episode: 0,
            rng,
        })
    }

    pub fn q_table(&self) -> &QTable<E::State, E::Action> {
        &self.q_table
    }

    pub fn memory(&self) -> &ReplayMemory<E> {
        &self.memory
    }

    /// The current exploration probability
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.trainings)
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Choose an action with the epsilon greedy policy, or purely greedily if `ignore_exploration`
    ///
    /// Ties between equally valued actions go to the one listed first.
    ///
    /// **Errors** if `actions` is empty
    pub fn act(
        &mut self,
        state: E::State,
        actions: &[E::Action],
        ignore_exploration: bool,
    ) -> Result<E::Action> {
        if actions.is_empty() {
            return Err(Error::InvalidTransition("cannot act without legal actions"));
        }

        let choice = if ignore_exploration {
            Choice::Exploit
        } else {
            self.exploration.choose(self.trainings, &mut self.rng)
        };

        let action = match choice {
            Choice::Explore => actions.choose(&mut self.rng).copied(),
            Choice::Exploit => self.q_table.best(state, actions),
        };
        Ok(action.expect("actions is not empty"))
    }

    /// Move `Q(state, action)` towards `reward + gamma * max_a Q(next_state, a)`
    ///
    /// An empty `next_actions` marks a terminal transition with no future value.
    pub fn update(
        &mut self,
        state: E::State,
        action: E::Action,
        reward: f32,
        next_state: E::State,
        next_actions: &[E::Action],
    ) {
        let q_value = self.q_table.get(state, action);
        let target = reward + self.gamma * self.q_table.max_value(next_state, next_actions);
        self.q_table
            .set(state, action, q_value + self.alpha * (target - q_value));
    }

    /// Remember an experience for later replay, evicting the oldest once full
    pub fn store_experience(&mut self, exp: Exp<E>) {
        self.memory.push(exp);
    }

    /// Replay a random batch of stored experiences and decay epsilon
    ///
    /// Does nothing until the memory holds at least one batch.
    ///
    /// **Returns** whether a training round took place
    pub fn train(&mut self) -> bool {
        let Some(batch) = self.memory.sample(&mut self.rng) else {
            return false;
        };

        let action_space = E::action_space();
        for exp in batch {
            let (next_state, next_actions) = match exp.next_state {
                Some(next) => (next, action_space.as_slice()),
                None => (exp.state, &[][..]),
            };
            self.update(exp.state, exp.action, exp.reward, next_state, next_actions);
        }

        self.trainings += 1;
        debug!(
            "training round {} done, epsilon now {:.4}",
            self.trainings,
            self.epsilon()
        );
        true
    }

    /// Forget everything learned: the Q-table, the replay memory and the epsilon schedule
    pub fn reset(&mut self) {
        self.q_table.clear();
        self.memory.clear();
        self.trainings = 0;
        self.episode = 0;
    }

    /// Run one training episode of at most `max_steps` steps, then train once
    ///
    /// The stored action is always the one requested, even when the environment corrects it.
    pub fn go(&mut self, env: &mut E, max_steps: usize) -> Result<EpisodeSummary> {
        let summary = self.run(env, max_steps, false)?;
        self.train();
        self.episode += 1;

        info!(
            "episode {}: {} steps, total reward {}, epsilon {:.4}",
            summary.episode,
            summary.steps,
            summary.total_reward,
            self.epsilon()
        );
        Ok(summary)
    }

    /// Run one greedy episode without storing experiences or learning
    pub fn play(&mut self, env: &mut E, max_steps: usize) -> Result<EpisodeSummary> {
        self.run(env, max_steps, true)
    }

    fn run(&mut self, env: &mut E, max_steps: usize, greedy: bool) -> Result<EpisodeSummary> {
        let mut current = env.reset()?;
        let mut steps = 0;
        let mut total_reward = 0.0;

        while !current.done && steps < max_steps {
            let action = self.act(current.observation, &current.actions, greedy)?;
            let next = env.step(action)?;
            if !greedy {
                self.store_experience(Exp {
                    state: current.observation,
                    action,
                    reward: next.reward,
                    next_state: (!next.done).then_some(next.observation),
                });
            }
            total_reward += next.reward;
            steps += 1;
            current = next;
        }

        if !current.done {
            warn!("episode {} hit the step cap of {}", self.episode, max_steps);
        }

        Ok(EpisodeSummary {
            episode: self.episode,
            steps,
            total_reward,
            finished: current.done,
        })
    }
}

impl<E> QLearningAgent<E>
where
    E: Environment,
    E::State: Hashable + Serialize + DeserializeOwned,
    E::Action: Hashable + Serialize + DeserializeOwned,
{
    /// Write the Q-table to `writer`
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        self.q_table.save(writer)
    }

    /// Replace the Q-table with one read from `reader`
    pub fn load<R: Read>(&mut self, reader: R) -> Result<()> {
        self.q_table = QTable::load(reader)?;
        Ok(())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.save(&mut writer)?;
        writer.flush()?;
        info!("saved {} q-values to {}", self.q_table.len(), path.display());
        Ok(())
    }

    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.load(BufReader::new(File::open(path)?))?;
        info!("loaded {} q-values from {}", self.q_table.len(), path.display());
        Ok(())
    }
}
