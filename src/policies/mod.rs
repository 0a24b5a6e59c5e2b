pub mod epsilon_greedy;
mod rng;

pub use epsilon_greedy::EpsilonGreedy;
pub use rng::MaybeSeededRng;
