pub mod position;

pub use position::{ClosedTrade, ExitReason, OpenPosition, Side};
