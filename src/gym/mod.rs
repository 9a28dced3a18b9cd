pub mod snake;

pub use snake::SnakeEnv;
