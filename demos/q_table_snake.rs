use snake_rl::{
    algo::{QLearningAgent, QLearningAgentConfig},
    env::Environment,
    gym::{
        snake::{GridWorld, RewardPolicy, VisionEncoder, WorldConfig},
        SnakeEnv,
    },
};

const NUM_EPISODES: u32 = 5000;
const MAX_STEPS: usize = 1000;
const REPORT_EVERY: u32 = 500;

fn main() -> snake_rl::Result<()> {
    let world = GridWorld::new(WorldConfig {
        random_start: true,
        ..Default::default()
    })?;
    let mut env = SnakeEnv::new(world, RewardPolicy::strong());
    let config = QLearningAgentConfig {
        gamma: 0.95,
        ..Default::default()
    };
    let mut agent = QLearningAgent::new(config)?;

    let mut best_score = 0.0;
    for i in 0..NUM_EPISODES {
        agent.go(&mut env, MAX_STEPS)?;
        let report = env.report.take();
        let score = report.get("score").copied().unwrap_or_default();
        if score > best_score {
            best_score = score;
        }
        if (i + 1) % REPORT_EVERY == 0 {
            println!(
                "episode {:>5}: score {:>3}, reward {:>8.1}, steps {:>4}, epsilon {:.3}, best {}",
                i + 1,
                score,
                report.get("reward").copied().unwrap_or_default(),
                report.get("steps").copied().unwrap_or_default(),
                agent.epsilon(),
                best_score,
            );
        }
    }

    let path = std::env::temp_dir().join("q_table_snake.json");
    agent.save_to(&path)?;
    println!("saved {} q-values to {}", agent.q_table().len(), path.display());

    let summary = agent.play(&mut env, MAX_STEPS)?;
    println!(
        "greedy playback: {} steps, total reward {}, final length {}",
        summary.steps,
        summary.total_reward,
        env.world().len()
    );
    if env.is_active() {
        println!("{}", env.world());
        println!("{}", VisionEncoder::render(env.world()));
    }

    Ok(())
}
