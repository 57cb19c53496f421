mod dirty_set;
mod match_record;
mod order;
mod position;

pub use dirty_set::{DirtyEntry, DirtySet};
pub use match_record::{DEFAULT_MATCH_DESCRIPTION, MatchId, MatchRecord};
pub use order::{Order, OrderId};
pub use position::Position;
