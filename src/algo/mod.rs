pub mod tabular;

pub use tabular::q_table::{EpisodeSummary, QLearningAgent, QLearningAgentConfig, QTable};
