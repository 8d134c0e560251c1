pub mod analyzer;
pub mod stats;

pub use analyzer::{analyze, analyze_value};
pub use stats::{StatName, StatValue, StatisticsRecord, UnknownStat};
