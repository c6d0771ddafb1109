mod priority;
pub use priority::PriorityClass;

mod tier;
pub use tier::{Tier, TierRank};

mod state;
pub use state::TaskState;
