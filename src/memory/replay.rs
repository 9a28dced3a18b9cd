use rand::{seq::SliceRandom, Rng};

use crate::{ds::RingBuffer, env::Environment};

use super::Exp;

/// A fixed-size memory storage for reinforcement learning experiences
///
/// This structure uses a ring buffer to store experiences, which are tuples of (state, action, reward, next state).
/// It automatically overwrites the oldest experiences once it reaches its capacity.
///
/// ### Fields:
/// - `memory`: A `RingBuffer` that stores the experiences
/// - `batch_size`: The number of experiences drawn per sample
pub struct ReplayMemory<E: Environment> {
    memory: RingBuffer<Exp<E>>,
    batch_size: usize,
}

impl<E: Environment> ReplayMemory<E> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
            batch_size,
        }
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Add a new experience to the memory, evicting the oldest one if full
    pub fn push(&mut self, exp: Exp<E>) {
        self.memory.push(exp);
    }

    /// Iterate over the stored experiences from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Exp<E>> {
        self.memory.iter()
    }

    pub fn clear(&mut self) {
        self.memory.clear();
    }

    /// Sample a batch of distinct experiences uniformly at random
    ///
    /// ### Returns
    /// - `Some(experiences)` if the batch size is less than or equal to the number of stored experiences
    /// - `None` otherwise
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec<Exp<E>>> {
        if self.batch_size <= self.memory.len() {
            Some(
                self.memory
                    .view()
                    .choose_multiple(rng, self.batch_size)
                    .cloned()
                    .collect(),
            )
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::env::tests::MockEnv;

    const MEMORY_CAP: usize = 4;
    const BATCH_SIZE: usize = 2;

    fn create_mock_exp_vec(n: i32) -> Vec<Exp<MockEnv>> {
        (0..n)
            .map(|i| Exp {
                state: i,
                action: true,
                reward: 1.0,
                next_state: Some(i + 1),
            })
            .collect()
    }

    #[test]
    fn replay_memory_functional() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut memory = ReplayMemory::<MockEnv>::new(MEMORY_CAP, BATCH_SIZE);

        assert!(
            memory.sample(&mut rng).is_none(),
            "sample none when too few experiences"
        );

        for exp in create_mock_exp_vec(2) {
            memory.push(exp);
        }

        let batch = memory.sample(&mut rng).unwrap();
        assert_eq!(batch.len(), BATCH_SIZE, "sample works");
        assert_ne!(batch[0].state, batch[1].state, "sampled without replacement");
    }

    #[test]
    fn replay_memory_evicts_oldest() {
        let mut memory = ReplayMemory::<MockEnv>::new(MEMORY_CAP, BATCH_SIZE);
        for exp in create_mock_exp_vec(6) {
            memory.push(exp);
        }

        assert_eq!(memory.len(), MEMORY_CAP, "capacity bounded");
        let states = memory.iter().map(|e| e.state).collect::<Vec<_>>();
        assert_eq!(states, [2, 3, 4, 5], "two oldest experiences dropped");
    }
}
