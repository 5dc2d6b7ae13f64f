//! Base-fine lookup, severity multipliers and reporting totals.

mod calculator;
mod summary;
mod table;

pub use calculator::{FineBreakdown, FineCalculator, round_half_up};
pub use summary::{FineSummary, Tally};
pub use table::FineTable;
