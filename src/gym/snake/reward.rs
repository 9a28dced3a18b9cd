use super::world::Event;

/// Fixed mapping from a step's [`Event`] to a scalar reward
///
/// Death costs far more than the per-step penalty so that ending an episode early is never
/// cheaper than surviving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardPolicy {
    pub none: f32,
    pub no_collision: f32,
    pub beneficial_eaten: f32,
    pub harmful_eaten: f32,
    pub died: f32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            none: 0.0,
            no_collision: -1.0,
            beneficial_eaten: 10.0,
            harmful_eaten: -10.0,
            died: -1000.0,
        }
    }
}

impl RewardPolicy {
    /// The alternate tuning with doubled item rewards
    pub fn strong() -> Self {
        Self {
            beneficial_eaten: 20.0,
            harmful_eaten: -20.0,
            ..Default::default()
        }
    }

    pub fn reward(&self, event: Event) -> f32 {
        match event {
            Event::None => self.none,
            Event::NoCollision => self.no_collision,
            Event::BeneficialEaten => self.beneficial_eaten,
            Event::HarmfulEaten => self.harmful_eaten,
            Event::Died => self.died,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_table() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.reward(Event::None), 0.0);
        assert_eq!(policy.reward(Event::NoCollision), -1.0);
        assert_eq!(policy.reward(Event::BeneficialEaten), 10.0);
        assert_eq!(policy.reward(Event::HarmfulEaten), -10.0);
        assert_eq!(policy.reward(Event::Died), -1000.0);

        let strong = RewardPolicy::strong();
        assert_eq!(strong.reward(Event::BeneficialEaten), 20.0);
        assert_eq!(strong.reward(Event::HarmfulEaten), -20.0);
        assert_eq!(strong.reward(Event::Died), -1000.0, "death cost unchanged");
    }
}
