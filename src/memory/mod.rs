mod exp;
mod replay;

pub use exp::Exp;
pub use replay::ReplayMemory;
