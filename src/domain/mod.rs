// Domain types and value objects
mod candle;
mod flow;
mod open_interest;

// Re-export commonly used types to the world
pub use candle::Candle;
pub use flow::{FlowRecord, FlowSeries, resolve_flow_column};
pub use open_interest::{OiLevel, OpenInterestSeries};
